//! 802.11 frame type / subtype catalog (802.11-2016 9.2.4.1.3).
//!
//! Every injectable subtype carries a [`FrameShape`] describing how its test
//! frame is laid out; the builder in `tx` consumes these descriptors.

use bitfield_struct::bitfield;
use strum_macros::{Display, EnumIter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u8)]
pub enum FrameType {
    Management = 0,
    Control = 1,
    Data = 2,
    Extension = 3,
}

impl FrameType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[bitfield(u16)]
pub struct FrameControl {
    /// Ordered LSB to MSB
    #[bits(2)]
    pub protocol: u8,
    #[bits(2)]
    pub frame_type: u8,
    #[bits(4)]
    pub frame_subtype: u8,
    // Flags
    pub to_ds: bool,
    pub from_ds: bool,
    pub more_fragments: bool,
    pub retry: bool,
    pub power_management: bool,
    pub more_data: bool,
    pub protected_frame: bool,
    pub order: bool,
}

/// Which MAC header address fields a frame carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// RA only (CTS, Ack, ...).
    ReceiverOnly,
    /// RA + TA, no sequence control.
    ReceiverTransmitter,
    /// addr1..addr3 followed by sequence control.
    ThreeAddress,
}

/// Fixed fields placed between the MAC header and the information elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixedFields {
    None,
    /// Timestamp, beacon interval, capability.
    Beacon,
    /// Capability, listen interval.
    AssociationRequest,
    /// Capability, status, association ID.
    AssociationResponse,
    /// Capability, listen interval, current AP address.
    ReassociationRequest,
    /// Reason code.
    Reason,
    /// Algorithm, transaction sequence, status.
    Authentication,
}

/// Declarative layout of one test frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameShape {
    pub addressing: Addressing,
    pub broadcast: bool,
    pub fixed: FixedFields,
    pub qos: bool,
    pub llc: bool,
}

impl FrameShape {
    const fn management(fixed: FixedFields) -> Self {
        FrameShape {
            addressing: Addressing::ThreeAddress,
            broadcast: false,
            fixed,
            qos: false,
            llc: false,
        }
    }

    const fn control(addressing: Addressing, fixed: FixedFields) -> Self {
        FrameShape {
            addressing,
            broadcast: false,
            fixed,
            qos: false,
            llc: false,
        }
    }

    const fn data(qos: bool) -> Self {
        FrameShape {
            addressing: Addressing::ThreeAddress,
            broadcast: false,
            fixed: FixedFields::None,
            qos,
            llc: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubtypeEntry {
    pub frame_type: FrameType,
    pub subtype: u8,
    pub name: &'static str,
    /// `None` for subtypes that are listed but never injected.
    pub shape: Option<FrameShape>,
}

impl SubtypeEntry {
    /// Wireshark-style display filter matching this subtype.
    pub fn display_filter(&self) -> String {
        format!(
            "wlan.fc.type_subtype == 0x{:03x}{:x}",
            self.frame_type.code(),
            self.subtype
        )
    }

    pub fn frame_control(&self) -> FrameControl {
        FrameControl::new()
            .with_protocol(0)
            .with_frame_type(self.frame_type.code())
            .with_frame_subtype(self.subtype)
    }
}

const fn entry(
    frame_type: FrameType,
    subtype: u8,
    name: &'static str,
    shape: Option<FrameShape>,
) -> SubtypeEntry {
    SubtypeEntry {
        frame_type,
        subtype,
        name,
        shape,
    }
}

use Addressing::{ReceiverOnly, ReceiverTransmitter};
use FixedFields as Fx;
use FrameType::{Control, Data, Extension, Management};

const MGMT_BEACON: Option<FrameShape> = Some(FrameShape::management(Fx::Beacon));
const CTRL_RA: Option<FrameShape> = Some(FrameShape::control(ReceiverOnly, Fx::Beacon));
const CTRL_RA_TA: Option<FrameShape> =
    Some(FrameShape::control(ReceiverTransmitter, Fx::Beacon));
const DATA: Option<FrameShape> = Some(FrameShape::data(false));
const QOS_DATA: Option<FrameShape> = Some(FrameShape::data(true));

// Action, ATIM, Timing Advertisement and most control subtypes reuse the
// beacon body so every frame carries the same identification elements.
pub static FRAME_SUBTYPES: [SubtypeEntry; 45] = [
    // Management
    entry(
        Management,
        0,
        "Association Request",
        Some(FrameShape::management(Fx::AssociationRequest)),
    ),
    entry(
        Management,
        1,
        "Association Response",
        Some(FrameShape::management(Fx::AssociationResponse)),
    ),
    entry(
        Management,
        2,
        "Reassociation Request",
        Some(FrameShape::management(Fx::ReassociationRequest)),
    ),
    entry(
        Management,
        3,
        "Reassociation Response",
        Some(FrameShape::management(Fx::AssociationResponse)),
    ),
    entry(
        Management,
        4,
        "Probe Request",
        Some(FrameShape::management(Fx::None)),
    ),
    entry(Management, 5, "Probe Response", MGMT_BEACON),
    entry(Management, 6, "Timing Advertisement", MGMT_BEACON),
    entry(
        Management,
        8,
        "Beacon",
        Some(FrameShape {
            broadcast: true,
            ..FrameShape::management(Fx::Beacon)
        }),
    ),
    entry(Management, 9, "ATIM", MGMT_BEACON),
    entry(
        Management,
        10,
        "Disassociation",
        Some(FrameShape::management(Fx::Reason)),
    ),
    entry(
        Management,
        11,
        "Authentication",
        Some(FrameShape::management(Fx::Authentication)),
    ),
    entry(
        Management,
        12,
        "Deauthentication",
        Some(FrameShape::management(Fx::Reason)),
    ),
    entry(Management, 13, "Action", MGMT_BEACON),
    entry(Management, 14, "Action No Ack", MGMT_BEACON),
    // Control
    entry(Control, 2, "Trigger", CTRL_RA_TA),
    entry(Control, 3, "TACK", CTRL_RA_TA),
    entry(Control, 4, "Beamforming Report Poll", CTRL_RA_TA),
    entry(Control, 5, "VHT/HE NDP Announcement", CTRL_RA_TA),
    entry(Control, 6, "Control Frame Extension", CTRL_RA),
    entry(Control, 7, "Control Wrapper", CTRL_RA),
    entry(Control, 8, "Block Ack Request", CTRL_RA_TA),
    entry(Control, 9, "Block Ack", CTRL_RA_TA),
    entry(Control, 10, "PS-Poll", CTRL_RA_TA),
    entry(Control, 11, "RTS", CTRL_RA_TA),
    entry(Control, 12, "CTS", CTRL_RA),
    entry(
        Control,
        13,
        "Ack",
        Some(FrameShape::control(ReceiverOnly, Fx::None)),
    ),
    entry(Control, 14, "CF-End", CTRL_RA_TA),
    entry(Control, 15, "CF-End+CF-Ack", CTRL_RA_TA),
    // Data
    entry(Data, 0, "Data", DATA),
    entry(Data, 1, "Data+CF-Ack", DATA),
    entry(Data, 2, "Data+CF-Poll", DATA),
    entry(Data, 3, "Data+CF-Ack+CF-Poll", DATA),
    entry(Data, 4, "Null (no data)", DATA),
    entry(Data, 5, "CF-Ack (no data)", DATA),
    entry(Data, 6, "CF-Poll (no data)", DATA),
    entry(Data, 7, "CF-Ack+CF-Poll (no data)", DATA),
    entry(Data, 8, "QoS Data", QOS_DATA),
    entry(Data, 9, "QoS Data+CF-Ack", QOS_DATA),
    entry(Data, 10, "QoS Data+CF-Poll", QOS_DATA),
    entry(Data, 11, "QoS Data+CF-Ack+CF-Poll", QOS_DATA),
    entry(Data, 12, "QoS Null (no data)", QOS_DATA),
    entry(Data, 14, "QoS CF-Poll (no data)", QOS_DATA),
    entry(Data, 15, "QoS CF-Ack+CF-Poll (no data)", QOS_DATA),
    // Extension
    entry(Extension, 0, "DMG Beacon", None),
    entry(Extension, 1, "S1G Beacon", None),
];

/// Subtypes that get a test frame, in injection order.
pub fn injectable() -> impl Iterator<Item = &'static SubtypeEntry> + Clone {
    FRAME_SUBTYPES.iter().filter(|entry| entry.shape.is_some())
}

pub fn entries_of(frame_type: FrameType) -> impl Iterator<Item = &'static SubtypeEntry> + Clone {
    FRAME_SUBTYPES
        .iter()
        .filter(move |entry| entry.frame_type == frame_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn catalog_counts() {
        assert_eq!(entries_of(Management).count(), 14);
        assert_eq!(entries_of(Control).count(), 14);
        assert_eq!(entries_of(Data).count(), 15);
        assert_eq!(entries_of(Extension).count(), 2);
        assert_eq!(injectable().count(), 43);
        assert!(injectable().all(|e| e.frame_type != Extension));
    }

    #[test]
    fn no_duplicate_codes() {
        for frame_type in FrameType::iter() {
            let mut codes: Vec<u8> = entries_of(frame_type).map(|e| e.subtype).collect();
            let len = codes.len();
            codes.dedup();
            assert_eq!(codes.len(), len, "{frame_type}");
            assert!(codes.iter().all(|&c| c < 16));
        }
    }

    #[test]
    fn reserved_subtypes_absent() {
        let has = |t: FrameType, s: u8| {
            FRAME_SUBTYPES
                .iter()
                .any(|e| e.frame_type == t && e.subtype == s)
        };
        assert!(!has(Management, 7));
        assert!(!has(Management, 15));
        assert!(!has(Control, 0));
        assert!(!has(Control, 1));
        assert!(!has(Data, 13));
    }

    #[test]
    fn display_filters() {
        let beacon = FRAME_SUBTYPES
            .iter()
            .find(|e| e.name == "Beacon")
            .unwrap();
        assert_eq!(beacon.display_filter(), "wlan.fc.type_subtype == 0x0008");

        let rts = FRAME_SUBTYPES.iter().find(|e| e.name == "RTS").unwrap();
        assert_eq!(rts.display_filter(), "wlan.fc.type_subtype == 0x001b");

        let qos = FRAME_SUBTYPES
            .iter()
            .find(|e| e.name == "QoS CF-Ack+CF-Poll (no data)")
            .unwrap();
        assert_eq!(qos.display_filter(), "wlan.fc.type_subtype == 0x002f");

        let s1g = FRAME_SUBTYPES
            .iter()
            .find(|e| e.name == "S1G Beacon")
            .unwrap();
        assert_eq!(s1g.display_filter(), "wlan.fc.type_subtype == 0x0031");
    }

    #[test]
    fn frame_control_bytes() {
        for entry in FRAME_SUBTYPES.iter() {
            let fc = u16::from(entry.frame_control()).to_le_bytes();
            assert_eq!(fc[0], (entry.subtype << 4) | (entry.frame_type.code() << 2));
            assert_eq!(fc[1], 0);
        }
    }

    #[test]
    fn qos_only_on_qos_subtypes() {
        for entry in injectable() {
            let shape = entry.shape.unwrap();
            assert_eq!(
                shape.qos,
                entry.frame_type == Data && entry.subtype >= 8,
                "{}",
                entry.name
            );
        }
    }
}
