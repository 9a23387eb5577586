//! Named modulation profiles and their radiotap encodings.
//!
//! Each profile becomes the radiotap header prepended to every test frame, so
//! the driver transmits the frame with that rate / MCS / VHT / HE setting.
//! Field layouts follow <https://www.radiotap.org/fields/defined>.

use std::fmt;

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};

use crate::error::{InjectError, Result};

bitflags! {
    /// Radiotap `it_present` bits used by the profiles.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RadiotapPresent: u32 {
        const RATE = 1 << 2;
        const MCS = 1 << 19;
        const VHT = 1 << 21;
        const HE = 1 << 23;
    }
}

bitflags! {
    /// MCS field `known` byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct McsKnown: u8 {
        const BANDWIDTH = 0x01;
        const MCS_INDEX = 0x02;
        const GUARD_INTERVAL = 0x04;
        const HT_FORMAT = 0x08;
        const FEC_TYPE = 0x10;
        const STBC = 0x20;
        const NESS = 0x40;
    }
}

bitflags! {
    /// MCS field `flags` byte (bandwidth lives in the low two bits).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct McsFlags: u8 {
        const BW_40 = 0x01;
        const SHORT_GI = 0x04;
        const GREENFIELD = 0x08;
        const FEC_LDPC = 0x10;
    }
}

bitflags! {
    /// VHT field `known` word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VhtKnown: u16 {
        const STBC = 0x0001;
        const TXOP_PS = 0x0002;
        const GUARD_INTERVAL = 0x0004;
        const BANDWIDTH = 0x0040;
    }
}

bitflags! {
    /// VHT field `flags` byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VhtFlags: u8 {
        const STBC = 0x01;
        const TXOP_PS_NOT_ALLOWED = 0x02;
        const SHORT_GI = 0x04;
    }
}

const VHT_BANDWIDTH_80: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HtBandwidth {
    Mhz20,
    Mhz40,
}

/// Physical-layer parameters of one profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phy {
    /// Legacy a/b/g; `rate` is in 500 kbps units.
    Legacy { rate: u8 },
    Ht {
        mcs: u8,
        bandwidth: HtBandwidth,
        short_gi: bool,
        ldpc: bool,
    },
    /// 80 MHz VHT, single user.
    Vht {
        mcs: u8,
        nss: u8,
        short_gi: bool,
        stbc: bool,
    },
    /// Raw HE data1..data6 words.
    He { data: [u16; 6] },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModulationProfile {
    pub name: &'static str,
    pub phy: Phy,
}

const fn ht(name: &'static str, mcs: u8, bandwidth: HtBandwidth, ldpc: bool) -> ModulationProfile {
    ModulationProfile {
        name,
        phy: Phy::Ht {
            mcs,
            bandwidth,
            short_gi: true,
            ldpc,
        },
    }
}

const fn vht(name: &'static str, mcs: u8, nss: u8) -> ModulationProfile {
    ModulationProfile {
        name,
        phy: Phy::Vht {
            mcs,
            nss,
            short_gi: true,
            stbc: true,
        },
    }
}

/// Every profile, in listing and injection order.
pub static MODULATIONS: [ModulationProfile; 17] = [
    ModulationProfile {
        name: "abg",
        phy: Phy::Legacy { rate: 24 },
    },
    ht("HT1SS20", 7, HtBandwidth::Mhz20, false),
    ht("HT1SS20LDPC", 7, HtBandwidth::Mhz20, true),
    ht("HT2SS20", 15, HtBandwidth::Mhz20, false),
    ht("HT3SS20", 23, HtBandwidth::Mhz20, false),
    ht("HT1SS40", 7, HtBandwidth::Mhz40, false),
    ht("HT2SS40", 15, HtBandwidth::Mhz40, false),
    ht("HT3SS40", 23, HtBandwidth::Mhz40, false),
    ht("HT2SS40LDPC", 15, HtBandwidth::Mhz40, true),
    ht("HT3SS40LDPC", 23, HtBandwidth::Mhz40, true),
    vht("VHT81SS", 8, 1),
    vht("VHT91SS", 9, 1),
    vht("VHT82SS", 8, 2),
    vht("VHT92SS", 9, 2),
    vht("VHT83SS", 8, 3),
    vht("VHT93SS", 9, 3),
    // HE-SU, MCS 9, 2 SS, 80 MHz, 1.6us GI, LDPC
    ModulationProfile {
        name: "HE",
        phy: Phy::He {
            data: [51196, 126, 10587, 0, 8338, 32514],
        },
    },
];

/// Keyword selecting every profile.
pub const ALL: &str = "ALL";

pub fn find(name: &str) -> Option<&'static ModulationProfile> {
    MODULATIONS.iter().find(|profile| profile.name == name)
}

/// Resolve a `-m` argument into the profiles to inject.
pub fn select(request: &str) -> Result<Vec<&'static ModulationProfile>> {
    if request.eq_ignore_ascii_case(ALL) {
        return Ok(MODULATIONS.iter().collect());
    }

    match find(request) {
        Some(profile) => Ok(vec![profile]),
        None => Err(InjectError::UnknownModulation {
            name: request.to_string(),
            available: MODULATIONS
                .iter()
                .map(|profile| profile.name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

impl ModulationProfile {
    /// Full radiotap header for this profile.
    pub fn radiotap(&self) -> Vec<u8> {
        let (present, align, field) = self.phy.field();
        radiotap_header(present, align, &field)
    }

    pub fn describe(&self) -> String {
        match self.phy {
            Phy::Legacy { rate } => {
                format!("Legacy rate {} Mbps", f32::from(rate) / 2.0)
            }
            Phy::Ht {
                mcs,
                bandwidth,
                short_gi,
                ldpc,
            } => format!(
                "HT MCS {} ({} SS), {}, {} GI, {}",
                mcs,
                mcs / 8 + 1,
                bandwidth,
                if short_gi { "short" } else { "long" },
                if ldpc { "LDPC" } else { "BCC" }
            ),
            Phy::Vht {
                mcs,
                nss,
                short_gi,
                stbc,
            } => format!(
                "VHT MCS {} {} SS, 80 MHz, {} GI{}",
                mcs,
                nss,
                if short_gi { "short" } else { "long" },
                if stbc { ", STBC" } else { "" }
            ),
            Phy::He { data } => {
                let mcs = (data[2] >> 8) & 0x0f;
                let ldpc = data[2] & 0x2000 != 0;
                let bandwidth = match data[4] & 0x0f {
                    0 => "20 MHz",
                    1 => "40 MHz",
                    2 => "80 MHz",
                    3 => "160 MHz",
                    _ => "RU",
                };
                let gi = match (data[4] >> 4) & 0x03 {
                    0 => "0.8us",
                    1 => "1.6us",
                    2 => "3.2us",
                    _ => "reserved",
                };
                let nsts = data[5] & 0x0f;
                format!(
                    "HE-SU MCS {} {} SS, {}, {} GI, {}",
                    mcs,
                    nsts,
                    bandwidth,
                    gi,
                    if ldpc { "LDPC" } else { "BCC" }
                )
            }
        }
    }
}

impl fmt::Display for HtBandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HtBandwidth::Mhz20 => write!(f, "20 MHz"),
            HtBandwidth::Mhz40 => write!(f, "40 MHz"),
        }
    }
}

impl Phy {
    /// Present bit, alignment and body of the single radiotap field.
    fn field(&self) -> (RadiotapPresent, usize, Vec<u8>) {
        match *self {
            Phy::Legacy { rate } => (RadiotapPresent::RATE, 1, vec![rate]),
            Phy::Ht {
                mcs,
                bandwidth,
                short_gi,
                ldpc,
            } => {
                let mut known =
                    McsKnown::BANDWIDTH | McsKnown::MCS_INDEX | McsKnown::GUARD_INTERVAL;
                let mut flags = McsFlags::empty();
                if bandwidth == HtBandwidth::Mhz40 {
                    flags |= McsFlags::BW_40;
                }
                if short_gi {
                    flags |= McsFlags::SHORT_GI;
                }
                if ldpc {
                    known |= McsKnown::HT_FORMAT | McsKnown::FEC_TYPE | McsKnown::NESS;
                    flags |= McsFlags::FEC_LDPC;
                }
                (
                    RadiotapPresent::MCS,
                    1,
                    vec![known.bits(), flags.bits(), mcs],
                )
            }
            Phy::Vht {
                mcs,
                nss,
                short_gi,
                stbc,
            } => {
                let known = VhtKnown::STBC | VhtKnown::GUARD_INTERVAL | VhtKnown::BANDWIDTH;
                let mut flags = VhtFlags::empty();
                if stbc {
                    flags |= VhtFlags::STBC;
                }
                if short_gi {
                    flags |= VhtFlags::SHORT_GI;
                }

                let mut field = Vec::with_capacity(12);
                field.extend_from_slice(&known.bits().to_le_bytes());
                field.push(flags.bits());
                field.push(VHT_BANDWIDTH_80);
                // mcs_nss for users 0..3
                field.extend_from_slice(&[(mcs << 4) | (nss & 0x0f), 0, 0, 0]);
                field.push(0); // coding
                field.push(0); // group_id
                field.extend_from_slice(&0u16.to_le_bytes()); // partial_aid
                (RadiotapPresent::VHT, 2, field)
            }
            Phy::He { data } => {
                let mut field = Vec::with_capacity(12);
                for word in data {
                    field.extend_from_slice(&word.to_le_bytes());
                }
                (RadiotapPresent::HE, 2, field)
            }
        }
    }
}

/// Radiotap header carrying exactly one field, padded to its alignment.
fn radiotap_header(present: RadiotapPresent, align: usize, field: &[u8]) -> Vec<u8> {
    const FIXED_LEN: usize = 8;

    let pad = (align - FIXED_LEN % align) % align;
    let len = FIXED_LEN + pad + field.len();

    // version 0, pad 0
    let mut rth = vec![0u8; FIXED_LEN + pad];
    LittleEndian::write_u16(&mut rth[2..4], len as u16);
    LittleEndian::write_u32(&mut rth[4..8], present.bits());
    rth.extend_from_slice(field);
    rth
}
