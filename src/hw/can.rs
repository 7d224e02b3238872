// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CAN publication of spot values.
//!
//! - `CanTransport` wraps a HAL `can::Can` instance in `bxcan::Can`.
//! - Frames are queued without blocking; when all mailboxes are busy the frame is dropped and
//!   counted.

use bxcan::{self, Data, Frame, StandardId};
use stm32f7xx_hal::can as hal_can;
use stm32f7xx_hal::pac;

use crate::params::ParamStore;
use crate::transport::{encode_frame, CanSpeed, Transport, FRAME_MAP};

/// Transmit-only bxcan instance on CAN1.
pub struct CanTransport {
    can: bxcan::Can<hal_can::Can<pac::CAN1>>,
    dropped: u32,
}

impl CanTransport {
    /// Create and enable a bxcan instance at the given bit rate.
    pub fn new(hal_can: hal_can::Can<pac::CAN1>, speed: CanSpeed) -> Self {
        let can = bxcan::Can::builder(hal_can)
            .set_bit_timing(speed.btr())
            .set_loopback(false)
            .set_silent(false)
            .enable();

        log_info!("CAN1 up at {} bit/s", speed.bit_rate());

        Self { can, dropped: 0 }
    }

    /// Frames dropped because no mailbox was free.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Consume the wrapper and get back the underlying HAL CAN instance.
    pub fn free(self) -> hal_can::Can<pac::CAN1> {
        self.can.free()
    }

    fn queue(&mut self, id: u16, payload: &[u8; 8]) {
        let (Some(id), Some(data)) = (StandardId::new(id), Data::new(payload)) else {
            return;
        };
        let frame = Frame::new_data(id, data);

        match self.can.transmit(&frame) {
            Ok(_) => {}
            Err(nb::Error::WouldBlock) => self.dropped = self.dropped.wrapping_add(1),
            Err(nb::Error::Other(never)) => match never {},
        }
    }
}

impl Transport for CanTransport {
    fn send_all(&mut self, params: &ParamStore) {
        for mapping in &FRAME_MAP {
            self.queue(mapping.id, &encode_frame(params, mapping));
        }
    }
}
