use clap::{ArgAction, Parser};

use crate::resources::Resource;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    // API base url, e.g. https://harbor.local/api/v2.0
    #[arg(long, env = "HARBOR_BASE_URL")]
    pub(crate) base_url: String,

    // User whose permissions are being checked
    #[arg(long, env = "USER_NAME")]
    pub(crate) user_name: String,

    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    pub(crate) password: String,

    // Only needed by resources that create fixtures first
    #[arg(long, env = "ADMIN_USER_NAME")]
    pub(crate) admin_user_name: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub(crate) admin_password: Option<String>,

    // Permission group to run
    #[arg(long, env = "RESOURCE", value_enum)]
    pub(crate) resource: Resource,

    // Accept self-signed certificates
    #[arg(long, env = "HARBOR_INSECURE", default_value_t = true, action = ArgAction::Set)]
    pub(crate) insecure: bool,

    #[arg(long, env = "HARBOR_TIMEOUT_SECS", default_value = "30")]
    pub(crate) timeout_secs: u64,
}
