use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_server_ip")]
    pub server_ip: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,

    /// Public base URL used when building invitation links.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub smtp_use_tls: bool,
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// SMS delivery is optional; without a key the SMS channel is disabled.
    pub mnotify_api_key: Option<String>,
    #[serde(default = "default_mnotify_sender")]
    pub mnotify_sender: String,
}

fn default_port() -> u16 {
    8000
}
fn default_server_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_jwt_expiry_hours() -> i64 {
    72
}
fn default_site_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_smtp_host() -> String {
    "localhost".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_email_from() -> String {
    "FlowBoard <noreply@flowboard.local>".to_string()
}
fn default_mnotify_sender() -> String {
    "FlowBoard".to_string()
}

impl Config {
    pub fn load_envs() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
