#![allow(clippy::module_name_repetitions)]

/// Shot index (`.sfm`) files
pub mod index;
/// Side-file path derivation
pub mod paths;
pub(crate) mod reader;

use nom::{
    number::complete::{le_f32, le_f64, le_i16, le_u16, le_u32, le_u64},
    sequence::tuple,
    IResult,
};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

/// Number of receiver channels recorded per shot
pub const CHANNEL_COUNT: usize = 12;
/// Size of the header every message in a waveform file starts with
pub const MESSAGE_HEADER_LEN: usize = 8;
const SHOT_PREFIX_LEN: usize = 36;
const CHANNEL_INFO_LEN: usize = 16;
/// Size of the fixed part of a shot message, following the message header
pub const SHOT_LEN: usize = SHOT_PREFIX_LEN + CHANNEL_COUNT * CHANNEL_INFO_LEN;
/// Size of the ASCII header at the start of every waveform file
pub const WAVEFORM_FILE_HEADER_LEN: usize = 256;
/// Message id of a hydrographic shot
pub const MSG_HYDRO_SHOT: u16 = 0x3001;
/// Message id of a topographic shot
pub const MSG_TOPO_SHOT: u16 = 0x3002;

/// Receiver channels, in the order their data is stored in a shot message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, Display)]
#[allow(missing_docs)]
pub enum Channel {
    Shallow1,
    Shallow2,
    Shallow3,
    Shallow4,
    Deep1,
    Deep2,
    Deep3,
    Deep4,
    GainMonitorShallow,
    GainMonitorDeep,
    IrParallel,
    IrOrthogonal,
}

/// The header every waveform file message starts with
///
/// ```text
/// [message id: u16][message size: u16][sender sequence id: u32]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Kind of message
    pub id: u16,
    /// Size of the whole message, this header included
    pub size: u16,
    /// Sequence number assigned by the sender
    pub sequence: u32,
}

impl MessageHeader {
    /// Returns `true` for the message ids that carry a shot
    #[must_use]
    pub const fn is_shot(&self) -> bool {
        matches!(self.id, MSG_HYDRO_SHOT | MSG_TOPO_SHOT)
    }
}

/// Where the samples of one channel sit in the waveform payload of a shot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Sample time of the first pulse sample
    pub pulse_offset: u16,
    /// Number of pulse bytes
    pub pulse_length: u16,
    /// Sample time of the first reflex sample
    pub reflex_offset: u16,
    /// Number of reflex bytes
    pub reflex_length: u16,
    /// Time of the reflex window, nanoseconds after the pulse
    pub reflex_time: u32,
    /// Digitizer bias
    pub bias: i16,
    /// Channel status flags
    pub flags: u16,
}

/// The fixed part of a shot message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    /// GPS seconds of week
    pub timestamp: f64,
    /// System clock, microseconds
    pub system_time: u64,
    /// Scanner angle around the X axis
    pub scanner_angle_x: f32,
    /// Scanner angle around the Y axis
    pub scanner_angle_y: f32,
    /// Running shot counter
    pub shot_counter: u32,
    /// Status word
    pub status: u16,
    /// Acquisition mode
    pub mode: u16,
    /// Outgoing pulse energy
    pub pulse_energy: f32,
    /// Per channel sample layout
    pub channels: [ChannelInfo; CHANNEL_COUNT],
}

impl Shot {
    /// Returns the number of waveform bytes the channels declare
    #[must_use]
    pub fn waveform_len(&self) -> usize {
        self.channels
            .iter()
            .map(|c| usize::from(c.pulse_length) + usize::from(c.reflex_length))
            .sum()
    }
}

/// The samples of one channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelWaveform {
    /// Outgoing pulse samples
    pub pulse: Vec<u8>,
    /// Return (reflex) samples
    pub reflex: Vec<u8>,
}

/// A decoded shot message: header, fixed shot data and per channel samples
#[derive(Debug, Clone, PartialEq)]
pub struct ShotRecord {
    /// Message header
    pub header: MessageHeader,
    /// Fixed shot data
    pub shot: Shot,
    /// Samples in [`Channel`] order
    pub waveforms: Vec<ChannelWaveform>,
    /// Header of the waveform file the shot was read from
    pub file_header: WaveformFileHeader,
}

impl ShotRecord {
    /// Returns the samples of `channel`
    #[must_use]
    pub fn channel(&self, channel: Channel) -> &ChannelWaveform {
        &self.waveforms[channel as usize]
    }

    /// Iterates over every channel and its samples
    pub fn channels(&self) -> impl Iterator<Item = (Channel, &ChannelWaveform)> {
        Channel::iter().zip(self.waveforms.iter())
    }
}

/// The `#KEY value` lines at the start of a waveform file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveformFileHeader {
    /// Key/value pairs in file order, keys without the leading `#`
    pub entries: Vec<(String, String)>,
}

impl WaveformFileHeader {
    /// Returns the value of `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub(crate) fn parse_message_header(input: &[u8]) -> IResult<&[u8], MessageHeader> {
    let (input, (id, size, sequence)) = tuple((le_u16, le_u16, le_u32))(input)?;
    Ok((input, MessageHeader { id, size, sequence }))
}

fn parse_channel_info(input: &[u8]) -> IResult<&[u8], ChannelInfo> {
    let (input, (pulse_offset, pulse_length, reflex_offset, reflex_length, reflex_time, bias, flags)) =
        tuple((le_u16, le_u16, le_u16, le_u16, le_u32, le_i16, le_u16))(input)?;
    Ok((
        input,
        ChannelInfo {
            pulse_offset,
            pulse_length,
            reflex_offset,
            reflex_length,
            reflex_time,
            bias,
            flags,
        },
    ))
}

pub(crate) fn parse_shot(input: &[u8]) -> IResult<&[u8], Shot> {
    let (input, (timestamp, system_time, scanner_angle_x, scanner_angle_y)) =
        tuple((le_f64, le_u64, le_f32, le_f32))(input)?;
    let (input, (shot_counter, status, mode, pulse_energy)) =
        tuple((le_u32, le_u16, le_u16, le_f32))(input)?;
    let mut channels = [ChannelInfo::default(); CHANNEL_COUNT];
    let mut input = input;
    for channel in &mut channels {
        let (rest, info) = parse_channel_info(input)?;
        *channel = info;
        input = rest;
    }
    Ok((
        input,
        Shot {
            timestamp,
            system_time,
            scanner_angle_x,
            scanner_angle_y,
            shot_counter,
            status,
            mode,
            pulse_energy,
            channels,
        },
    ))
}

/// Splits a waveform payload into per channel samples
///
/// Channels are laid out in [`Channel`] order, each as its pulse bytes immediately followed by
/// its reflex bytes. Returns the number of bytes the channels need if `payload` is too short.
pub fn split_channels(shot: &Shot, payload: &[u8]) -> Result<Vec<ChannelWaveform>, usize> {
    let needed = shot.waveform_len();
    if needed > payload.len() {
        return Err(needed);
    }
    let mut rest = payload;
    let waveforms = shot
        .channels
        .iter()
        .map(|info| {
            let (pulse, after) = rest.split_at(usize::from(info.pulse_length));
            let (reflex, after) = after.split_at(usize::from(info.reflex_length));
            rest = after;
            ChannelWaveform {
                pulse: pulse.to_vec(),
                reflex: reflex.to_vec(),
            }
        })
        .collect();
    Ok(waveforms)
}
