use byteorder::{LittleEndian, WriteBytesExt};
use itertools::iproduct;

use crate::error::{InjectError, Result};
use crate::frametypes::{self, Addressing, FixedFields, FrameType, SubtypeEntry};
use crate::modulation::ModulationProfile;
use crate::util::MacAddress;

const ELEMENT_SSID: u8 = 0;
const ELEMENT_VENDOR_SPECIFIC: u8 = 221;
const MAX_SSID_LEN: usize = 32;
const MAX_ELEMENT_LEN: usize = 255;

/// OUI 00:01:02, vendor type 3, then a space before the identification text.
const VENDOR_PREFIX: [u8; 5] = [0x00, 0x01, 0x02, 0x03, b' '];

// 43210 written big-endian, the way the capture tooling expects to find it.
const DURATION_ID: [u8; 2] = 43210u16.to_be_bytes();

/// ESS + Privacy
const CAPABILITY_INFO: u16 = 0x0011;
const BEACON_INTERVAL: u16 = 100;
const LISTEN_INTERVAL: u16 = 50;
const STATUS_CODE: u16 = 1;
const ASSOCIATION_ID: u16 = 1001;
const AUTH_ALGORITHM: u16 = 0;
const AUTH_SEQUENCE: u16 = 1;
const AUTH_STATUS: u16 = 2;
/// Disassociated due to inactivity
const REASON_CODE: u16 = 4;

/// Inputs shared by every frame of a run.
#[derive(Clone, Debug)]
pub struct FrameContext {
    pub interface: String,
    pub source: MacAddress,
}

impl FrameContext {
    pub fn new(interface: &str, source: MacAddress) -> Self {
        FrameContext {
            interface: interface.to_string(),
            source,
        }
    }
}

/// One ready-to-send frame (radiotap header included).
#[derive(Clone, Debug)]
pub struct TestFrame {
    pub modulation: &'static str,
    pub frame_type: FrameType,
    pub subtype: u8,
    pub name: &'static str,
    pub bytes: Vec<u8>,
}

/// Sequence numbers 1..=4095, then wrap.
#[derive(Default)]
pub struct Sequence(u16);

impl Sequence {
    pub fn next(&mut self) -> u16 {
        self.0 = if self.0 >= 4095 { 1 } else { self.0 + 1 };
        self.0
    }
}

/// Text tying a received frame back to the adapter and modulation that sent it.
pub fn identification_tag(interface: &str, modulation: &str) -> String {
    format!("{}_{}", interface, modulation)
}

/// Body of the vendor specific element.
pub fn identification(interface: &str, modulation: &str) -> Vec<u8> {
    let tag = identification_tag(interface, modulation);
    let mut info = Vec::with_capacity(VENDOR_PREFIX.len() + tag.len());
    info.extend_from_slice(&VENDOR_PREFIX);
    info.extend_from_slice(tag.as_bytes());
    info
}

fn push_element(buf: &mut Vec<u8>, id: u8, info: &[u8], max: usize) -> Result<()> {
    if info.len() > max {
        return Err(InjectError::ElementTooLong {
            id,
            len: info.len(),
            max,
        });
    }
    buf.push(id);
    buf.push(info.len() as u8);
    buf.extend_from_slice(info);
    Ok(())
}

fn push_fixed_fields(buf: &mut Vec<u8>, fixed: FixedFields, source: &MacAddress) -> Result<()> {
    match fixed {
        FixedFields::None => {}
        FixedFields::Beacon => {
            buf.write_u64::<LittleEndian>(0)?; // timestamp
            buf.write_u16::<LittleEndian>(BEACON_INTERVAL)?;
            buf.write_u16::<LittleEndian>(CAPABILITY_INFO)?;
        }
        FixedFields::AssociationRequest => {
            buf.write_u16::<LittleEndian>(CAPABILITY_INFO)?;
            buf.write_u16::<LittleEndian>(LISTEN_INTERVAL)?;
        }
        FixedFields::AssociationResponse => {
            buf.write_u16::<LittleEndian>(CAPABILITY_INFO)?;
            buf.write_u16::<LittleEndian>(STATUS_CODE)?;
            buf.write_u16::<LittleEndian>(ASSOCIATION_ID)?;
        }
        FixedFields::ReassociationRequest => {
            buf.write_u16::<LittleEndian>(CAPABILITY_INFO)?;
            buf.write_u16::<LittleEndian>(LISTEN_INTERVAL)?;
            buf.extend_from_slice(&source.0); // current AP
        }
        FixedFields::Reason => {
            buf.write_u16::<LittleEndian>(REASON_CODE)?;
        }
        FixedFields::Authentication => {
            buf.write_u16::<LittleEndian>(AUTH_ALGORITHM)?;
            buf.write_u16::<LittleEndian>(AUTH_SEQUENCE)?;
            buf.write_u16::<LittleEndian>(AUTH_STATUS)?;
        }
    }
    Ok(())
}

/// Build a single test frame: radiotap header, MAC header, fixed fields,
/// SSID and identification elements, and an LLC header for data frames.
pub fn build_frame(
    ctx: &FrameContext,
    entry: &SubtypeEntry,
    profile: &ModulationProfile,
    sequence: u16,
) -> Result<Vec<u8>> {
    let shape = entry.shape.ok_or_else(|| {
        InjectError::Injection(format!("{} frames are not injectable", entry.name))
    })?;

    let mut frx = profile.radiotap();

    frx.write_u16::<LittleEndian>(u16::from(entry.frame_control()))?;
    frx.extend_from_slice(&DURATION_ID);

    let address_1 = if shape.broadcast {
        MacAddress::broadcast()
    } else {
        ctx.source
    };
    frx.extend_from_slice(&address_1.0);

    match shape.addressing {
        Addressing::ReceiverOnly => {}
        Addressing::ReceiverTransmitter => {
            frx.extend_from_slice(&ctx.source.0);
        }
        Addressing::ThreeAddress => {
            frx.extend_from_slice(&ctx.source.0);
            frx.extend_from_slice(&ctx.source.0);
            // fragment 0
            frx.write_u16::<LittleEndian>(sequence << 4)?;
        }
    }

    if shape.qos {
        frx.write_u16::<LittleEndian>(0)?;
    }

    push_fixed_fields(&mut frx, shape.fixed, &ctx.source)?;

    push_element(
        &mut frx,
        ELEMENT_SSID,
        ctx.interface.as_bytes(),
        MAX_SSID_LEN,
    )?;
    push_element(
        &mut frx,
        ELEMENT_VENDOR_SPECIFIC,
        &identification(&ctx.interface, profile.name),
        MAX_ELEMENT_LEN,
    )?;

    if shape.llc {
        // DSAP, SSAP, control
        frx.extend_from_slice(&[0x00, 0x00, 0x00]);
    }

    Ok(frx)
}

/// Every injectable subtype for every profile, modulation-major.
pub fn build_test_frames(
    ctx: &FrameContext,
    profiles: &[&'static ModulationProfile],
) -> Result<Vec<TestFrame>> {
    let mut sequence = Sequence::default();

    iproduct!(profiles.iter(), frametypes::injectable())
        .map(|(profile, entry)| {
            let bytes = build_frame(ctx, entry, profile, sequence.next())?;
            Ok(TestFrame {
                modulation: profile.name,
                frame_type: entry.frame_type,
                subtype: entry.subtype,
                name: entry.name,
                bytes,
            })
        })
        .collect()
}
