pub mod inventory;
pub mod kubectl;
pub mod loader;
pub mod resource;

pub use inventory::{InventoryResourceProvider, KubectlInventory, WorkloadInventory};
pub use loader::{AuditResourceProvider, AuditScope, KubeLoader};
pub use resource::{KubeResource, ResourceProvider, ResourceSelector};
