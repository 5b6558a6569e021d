use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::script::runner::HostIdentity;
use crate::utils::{is_ip_address, is_mac_address, is_valid_port};

/// Host represents a network host in the inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: i64,
    pub name: String,
    pub ip_address: String,
    pub port: u16,
    pub mac_address: String,
    pub created_at: DateTime<Utc>,
}

impl HostIdentity for Host {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.ip_address
    }
}

/// CreateHostRequest for creating new hosts
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHostRequest {
    pub name: String,
    pub ip_address: String,
    pub port: i64,
    /// Omitted means "no MAC"; an explicit value must be valid
    #[serde(default)]
    pub mac_address: Option<String>,
}

impl CreateHostRequest {
    /// Check field syntax; returns the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Host name is required.".to_string());
        }
        if !is_ip_address(&self.ip_address) {
            return Err("Invalid IP address. It must be either an IPv4 or IPv6 address.".to_string());
        }
        if let Some(ref mac) = self.mac_address {
            if !is_mac_address(mac) {
                return Err("Invalid MAC address.".to_string());
            }
        }
        if !is_valid_port(self.port) {
            return Err("Invalid TCP Port. It must be an integer between 1 and 65535.".to_string());
        }
        Ok(())
    }

    pub fn mac_or_empty(&self) -> &str {
        self.mac_address.as_deref().unwrap_or("")
    }
}

/// PingQuery carries the number of echo requests for ping endpoints
#[derive(Debug, Deserialize)]
pub struct PingQuery {
    #[serde(default = "default_ping_amount")]
    pub amount: u32,
}

impl PingQuery {
    /// Clamp amount to [1, max]
    pub fn sanitize(&self, max: u32) -> u32 {
        self.amount.clamp(1, max.max(1))
    }
}

fn default_ping_amount() -> u32 {
    3
}
