use turnover_core::PredictionService;

/// Handles inmutables compartidos por todas las peticiones.
pub struct AppState {
    pub service: PredictionService,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(service: PredictionService, api_key: Option<String>) -> Self {
        Self { service, api_key }
    }
}
