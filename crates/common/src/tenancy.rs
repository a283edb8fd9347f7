use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TenancyConfig {
    pub restrictor_label: String,
    pub restrict_queries: bool,
}

impl TenancyConfig {
    pub fn single_tenant(&self) -> bool {
        self.restrictor_label.is_empty()
    }
}
