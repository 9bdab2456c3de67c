//! Device role wiring onto the station runtime.

use std::sync::Arc;

use awdt_bus::{spawn_role, EventPublisher, LinkEnd, RoleHandle, Side};
use awdt_types::Role;
use tracing::info;

use crate::domain::DeviceState;
use crate::service::{DeviceContext, DeviceStations};

/// Start the device role. Inject a `boot` entry envelope into
/// [`DeviceState::Ingress`] to boot it.
pub fn spawn_device(
    ctx: Arc<DeviceContext>,
    link: LinkEnd,
    bus: Arc<dyn EventPublisher>,
) -> RoleHandle<DeviceState> {
    let policy = *ctx.crypto().policy();
    match ctx.crypto().metadata() {
        Some(meta) => info!(
            mode = %policy.mode(),
            algorithm = meta.algorithm,
            public_key_bytes = meta.public_key_bytes,
            signature_bytes = meta.signature_bytes,
            "[device] crypto provider ready"
        ),
        None => info!("[device] running without signatures"),
    }
    spawn_role(Side::Device, Arc::new(DeviceStations::new(ctx)), link, bus)
}

/// Label the coordinator seeds into a boot envelope.
pub const BOOT_LABEL: Role = Role::Boot;
