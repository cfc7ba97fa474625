use serde::{Deserialize, Serialize};

/// Permission identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "inventory.read")]
    InventoryRead,
    #[serde(rename = "inventory.write")]
    InventoryWrite,
    #[serde(rename = "stock.move")]
    StockMove,
    #[serde(rename = "reports.export")]
    ReportsExport,
    #[serde(rename = "users.manage")]
    UsersManage,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::InventoryRead => "inventory.read",
            Permission::InventoryWrite => "inventory.write",
            Permission::StockMove => "stock.move",
            Permission::ReportsExport => "reports.export",
            Permission::UsersManage => "users.manage",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
