use crate::config::Config;
use crate::service::CertificateService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CertificateService>,
    pub config: Arc<Config>,
}
