//! # Boundary Link
//!
//! In-process transport between the device and server roles. Only parcels
//! (JSON bytes plus addresses) and a shutdown control frame cross it.

use awdt_types::Parcel;
use tokio::sync::mpsc;

use crate::errors::BusError;

/// Frames exchanged across the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryFrame {
    /// Serialized envelope.
    Parcel(Parcel),
    /// End the receiving role's run.
    Shutdown,
}

/// One side's view of the link.
#[derive(Debug)]
pub struct LinkEnd {
    outbound: mpsc::Sender<BoundaryFrame>,
    inbound: mpsc::Receiver<BoundaryFrame>,
}

impl LinkEnd {
    /// Split into the sending and receiving halves.
    #[must_use]
    pub fn split(self) -> (mpsc::Sender<BoundaryFrame>, mpsc::Receiver<BoundaryFrame>) {
        (self.outbound, self.inbound)
    }

    /// Send a frame to the other side.
    pub async fn send(&self, frame: BoundaryFrame) -> Result<(), BusError> {
        self.outbound.send(frame).await.map_err(|_| BusError::LinkClosed)
    }

    /// Receive the next frame from the other side.
    pub async fn recv(&mut self) -> Option<BoundaryFrame> {
        self.inbound.recv().await
    }
}

/// Connected pair of link ends: `(device, server)`.
#[must_use]
pub fn boundary_link(capacity: usize) -> (LinkEnd, LinkEnd) {
    let (to_server, from_device) = mpsc::channel(capacity);
    let (to_device, from_server) = mpsc::channel(capacity);
    (
        LinkEnd {
            outbound: to_server,
            inbound: from_server,
        },
        LinkEnd {
            outbound: to_device,
            inbound: from_device,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use awdt_types::Addresses;

    #[tokio::test]
    async fn test_frames_cross_in_both_directions() {
        let (device, mut server) = boundary_link(4);
        let parcel = Parcel {
            body: b"{}".to_vec(),
            addresses: Addresses::default(),
        };
        device.send(BoundaryFrame::Parcel(parcel.clone())).await.unwrap();
        assert_eq!(server.recv().await, Some(BoundaryFrame::Parcel(parcel)));

        drop(server);
        assert!(matches!(
            device.send(BoundaryFrame::Shutdown).await,
            Err(BusError::LinkClosed)
        ));
    }
}
