//! Per-frame diagnostics.
//!
//! A [`FrameTracer`] sees every frame the transport sends and every frame it delivers, when
//! tracing is enabled in [`crate::TransportConfig`]. The default [`LogTracer`] writes one
//! `log::trace!` line per frame:
//!
//! ```text
//!  0 Tx 18e72680 8 01 02 03 04 05 06 07 08  ECU to VT
//! ```

use itertools::Itertools;

use crate::frame::{Direction, Frame, NodeId};

/// Lowest PDU format of the broadcast (PDU2) range.
const PDU2_MIN: u32 = 0xF000;

/// Receives one call per traced frame.
pub trait FrameTracer: Send {
    /// Called with the node, the direction and the frame.
    fn trace(&self, node: NodeId, direction: Direction, frame: &Frame);
}

impl<F> FrameTracer for F
where
    F: Fn(NodeId, Direction, &Frame) + Send,
{
    fn trace(&self, node: NodeId, direction: Direction, frame: &Frame) {
        self(node, direction, frame)
    }
}

/// Writes frames to the `log` facade at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl FrameTracer for LogTracer {
    fn trace(&self, node: NodeId, direction: Direction, frame: &Frame) {
        log::trace!("{}", format_line(node, direction, frame));
    }
}

/// Formats a frame as a single trace line.
///
/// The payload is always shown as eight bytes unless the length field is 0 or 3, so stale
/// buffer bytes of short frames are visible.
pub fn format_line(node: NodeId, direction: Direction, frame: &Frame) -> String {
    let bytes = match frame.len() {
        0 => String::new(),
        3 => format!("{:02x}", frame.raw_data()[..3].iter().format(" ")),
        _ => format!("{:02x}", frame.raw_data().iter().format(" ")),
    };
    let label = pgn_label(pgn_of(frame.id())).unwrap_or("");
    format!(
        "{node} {direction} {:8x} {:1} {bytes}  {label}",
        frame.id(),
        frame.len()
    )
    .trim_end()
    .to_string()
}

/// Extracts the parameter group number from a 29-bit J1939 / ISO 11783 identifier.
///
/// For destination specific (PDU1) groups the destination address is cleared.
pub fn pgn_of(id: u32) -> u32 {
    let pgn = (id & 0x03FF_FF00) >> 8;
    if pgn & 0xFF00 < PDU2_MIN {
        pgn & 0x03_FF00
    } else {
        pgn
    }
}

/// Short name of the well known parameter groups seen on an implement bus.
pub fn pgn_label(pgn: u32) -> Option<&'static str> {
    let label = match pgn {
        0xE600 => "VT to ECU",
        0xE700 => "ECU to VT",
        0xCB00 => "Process data",
        0xEB00 => "TP.DT",
        0xEC00 => "TP.CM",
        0xC800 => "ETP.CM",
        0xEE00 => "Address claimed",
        0xE800 => "Acknowledgement",
        0xFE0C => "Working set member",
        0xFE0D => "Working set master",
        0xFE0F => "Language command",
        0xFECA => "DM1",
        _ => return None,
    };
    Some(label)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn pdu1_destination_is_cleared() {
        // ECU to VT, destination 0x26, source 0x80
        assert_eq!(pgn_of(0x18E7_2680), 0xE700);
        assert_eq!(pgn_of(0x18E6_8026), 0xE600);
    }

    #[test]
    fn pdu2_group_extension_is_kept() {
        assert_eq!(pgn_of(0x18FE_CA80), 0xFECA);
        assert_eq!(pgn_of(0x0CFE_0D80), 0xFE0D);
    }

    #[test]
    fn labels() {
        assert_eq!(pgn_label(pgn_of(0x18EE_FF80)), Some("Address claimed"));
        assert_eq!(pgn_label(0x1F805), None);
    }

    #[test]
    fn line_layout() {
        let frame = Frame::extended(0x18E7_2680, &[1, 2, 3, 4, 5, 6, 7, 8], 8);
        assert_eq!(
            format_line(NodeId(0), Direction::Tx, &frame),
            " 0 Tx 18e72680 8 01 02 03 04 05 06 07 08  ECU to VT"
        );

        let frame = Frame::extended(0x100, &[0xAA, 0xBB, 0xCC], 3);
        assert_eq!(
            format_line(NodeId(1), Direction::Rx, &frame),
            " 1 Rx      100 3 aa bb cc"
        );
    }

    #[test]
    fn closures_are_tracers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracer = move |node: NodeId, direction: Direction, frame: &Frame| {
            sink.lock().unwrap().push((node, direction, frame.id()));
        };
        tracer.trace(NodeId(2), Direction::Rx, &Frame::extended(0x42, &[], 0));
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(NodeId(2), Direction::Rx, 0x42)]
        );
    }
}
