//! # Packet Serialization
//!
//! Zero-allocation codec for relay packets.
//!
//! ## Design
//!
//! - Pre-allocated buffers sized to [`MAX_PACKET_SIZE`]
//! - Explicit little-endian writes per field, no struct casts
//! - Framing is separate from decoding: a frame with a bad body still
//!   consumes exactly its announced payload, so the stream stays aligned

use std::io::Read;

use odyssey_shared::{FixedStr, PlayerId, Quat, Vec3, MAX_PACKET_SIZE};

use super::packets::*;
use crate::error::{NetError, NetResult};

/// Largest body a frame may announce.
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - PacketHeader::SIZE;

/// Packet serializer - writes packets to a pre-allocated buffer.
///
/// Reuse one instance per sending thread.
pub struct PacketSerializer {
    buffer: [u8; MAX_PACKET_SIZE],
    position: usize,
}

impl PacketSerializer {
    /// Creates a new serializer with a fresh buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_PACKET_SIZE],
            position: 0,
        }
    }

    /// Resets the serializer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.position + bytes.len() > MAX_PACKET_SIZE {
            return false;
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        true
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> bool {
        self.write_bytes(&[value])
    }

    /// Writes a signed byte.
    #[inline]
    pub fn write_i8(&mut self, value: i8) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes a bool as one byte.
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> bool {
        self.write_u8(u8::from(value))
    }

    /// Writes a u16 in little-endian format.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes an i16 in little-endian format.
    #[inline]
    pub fn write_i16(&mut self, value: i16) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes an i32 in little-endian format.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes a f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes a vector as three floats.
    #[inline]
    pub fn write_vec3(&mut self, value: Vec3) -> bool {
        value.to_array().iter().all(|&c| self.write_f32(c))
    }

    /// Writes a quaternion as x, y, z, w.
    #[inline]
    pub fn write_quat(&mut self, value: Quat) -> bool {
        value.to_array().iter().all(|&c| self.write_f32(c))
    }

    /// Writes a fixed-width string including its padding.
    #[inline]
    pub fn write_str<const N: usize>(&mut self, value: &FixedStr<N>) -> bool {
        self.write_bytes(value.as_bytes())
    }

    /// Writes a packet header.
    #[inline]
    pub fn write_header(&mut self, header: &PacketHeader) -> bool {
        self.write_bytes(bytemuck::bytes_of(&header.owner))
            && self.write_i16(header.packet_type)
            && self.write_u16(header.payload_len)
    }

    /// Serializes a complete packet, header first.
    pub fn serialize(&mut self, packet: &Packet) -> bool {
        self.reset();
        self.write_header(&packet.header()) && self.write_body(&packet.body)
    }

    /// Writes a body in its fixed layout.
    pub fn write_body(&mut self, body: &PacketBody) -> bool {
        match body {
            PacketBody::ClientInit(init) => self.write_u16(init.max_players),
            PacketBody::PlayerInfo(info) => {
                self.write_vec3(info.position)
                    && self.write_quat(info.rotation)
                    && info.blend_weights.iter().all(|&w| self.write_f32(w))
                    && self.write_i16(info.act)
                    && self.write_i16(info.sub_act)
            }
            PacketBody::HackCapInfo(cap) => {
                self.write_vec3(cap.position)
                    && self.write_quat(cap.rotation)
                    && self.write_bool(cap.is_visible)
                    && self.write_str(&cap.anim)
            }
            PacketBody::GameInfo(info) => {
                self.write_bool(info.is_2d)
                    && self.write_u8(info.scenario)
                    && self.write_str(&info.stage)
            }
            PacketBody::TagInfo(tag) => {
                self.write_u8(tag.update_type)
                    && self.write_bool(tag.is_it)
                    && self.write_u8(tag.seconds)
                    && self.write_u16(tag.minutes)
            }
            PacketBody::PlayerConnect(connect) => {
                self.write_i32(connect.connection_type as i32)
                    && self.write_u16(connect.max_players)
                    && self.write_str(&connect.client_name)
            }
            PacketBody::CostumeInfo(costume) => {
                self.write_str(&costume.body) && self.write_str(&costume.cap)
            }
            PacketBody::Check(check) => {
                self.write_i32(check.location_id)
                    && self.write_i32(check.item_type)
                    && self.write_i32(check.index)
                    && self.write_str(&check.object_id)
                    && self.write_str(&check.stage)
                    && self.write_i32(check.amount)
            }
            PacketBody::CaptureInfo(capture) => self.write_str(&capture.hack_name),
            PacketBody::ChangeStage(change) => {
                self.write_str(&change.stage)
                    && self.write_str(&change.entrance)
                    && self.write_i8(change.scenario)
                    && self.write_u8(change.sub_scenario_type)
            }
            PacketBody::Command(cmd) => self.write_str(&cmd.command),
            PacketBody::ItemCollect(item) => {
                self.write_str(&item.name) && self.write_i32(item.item_type)
            }
            PacketBody::FillerCollect(filler) => self.write_i32(filler.item_type),
            PacketBody::ChatMessage(chat) => chat.lines.iter().all(|line| self.write_str(line)),
            PacketBody::SlotData(slot) => {
                slot.world_costs.iter().all(|&c| self.write_u16(c))
                    && self.write_bool(slot.regionals)
                    && self.write_bool(slot.captures)
            }
            PacketBody::UnlockWorld(unlock) => self.write_i32(unlock.world_id),
            PacketBody::RegionalCollect(regional) => {
                self.write_str(&regional.object_id) && self.write_str(&regional.stage)
            }
            PacketBody::Progress(progress) => {
                self.write_i32(progress.world_id) && self.write_i32(progress.scenario)
            }
            PacketBody::ShineChecks(checks) => checks.uids.iter().all(|&uid| self.write_i16(uid)),
            PacketBody::ApInfo(info) => {
                self.write_i16(info.info_type)
                    && info.indices.iter().all(|&i| self.write_i16(i))
                    && info.names.iter().all(|name| self.write_str(name))
            }
            PacketBody::ShopReplace(shop) => {
                self.write_u8(shop.kind)
                    && shop.entries.iter().all(|e| {
                        self.write_u8(e.game_index)
                            && self.write_u8(e.slot_index)
                            && self.write_u8(e.item_index)
                            && self.write_u8(e.classification)
                    })
            }
            PacketBody::ShineReplace(replace) => replace
                .entries
                .iter()
                .all(|e| self.write_u8(e.item_type) && self.write_u8(e.name_index)),
            PacketBody::UdpInit(udp) => self.write_u16(udp.port),
            PacketBody::ShineColor(colors) => colors
                .entries
                .iter()
                .all(|e| self.write_i16(e.uid) && self.write_u8(e.color)),
            PacketBody::PlayerDisconnect | PacketBody::Deathlink | PacketBody::HolePunch => true,
        }
    }
}

impl Default for PacketSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Packet deserializer - reads packets from a buffer.
pub struct PacketDeserializer<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketDeserializer<'a> {
    /// Creates a new deserializer from a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Reads `N` raw bytes.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.buffer.get(self.position..self.position + N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.position += N;
        Some(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Reads a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Option<i8> {
        self.read_array().map(i8::from_le_bytes)
    }

    /// Reads a bool. Any non-zero byte is true.
    #[inline]
    pub fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    /// Reads a u16 in little-endian format.
    #[inline]
    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Reads an i16 in little-endian format.
    #[inline]
    pub fn read_i16(&mut self) -> Option<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    /// Reads an i32 in little-endian format.
    #[inline]
    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Reads a f32 in little-endian format.
    #[inline]
    pub fn read_f32(&mut self) -> Option<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Reads three floats.
    #[inline]
    pub fn read_vec3(&mut self) -> Option<Vec3> {
        Some(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Reads x, y, z, w.
    #[inline]
    pub fn read_quat(&mut self) -> Option<Quat> {
        Some(Quat::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    /// Reads a fixed-width string.
    #[inline]
    pub fn read_str<const N: usize>(&mut self) -> Option<FixedStr<N>> {
        self.read_array().map(FixedStr::from_bytes)
    }

    /// Reads a Pod type directly.
    #[inline]
    pub fn read_pod<T: bytemuck::Pod>(&mut self) -> Option<T> {
        let size = std::mem::size_of::<T>();
        let slice = self.buffer.get(self.position..self.position + size)?;
        self.position += size;
        bytemuck::try_pod_read_unaligned(slice).ok()
    }

    /// Reads a packet header.
    #[inline]
    pub fn read_header(&mut self) -> Option<PacketHeader> {
        Some(PacketHeader {
            owner: self.read_pod::<PlayerId>()?,
            packet_type: self.read_i16()?,
            payload_len: self.read_u16()?,
        })
    }

    /// Reads a body of the given type in its fixed layout.
    pub fn read_body(&mut self, packet_type: PacketType) -> Option<PacketBody> {
        let body = match packet_type {
            PacketType::Unknown => return None,
            PacketType::ClientInit => PacketBody::ClientInit(Init {
                max_players: self.read_u16()?,
            }),
            PacketType::PlayerInfo => {
                let position = self.read_vec3()?;
                let rotation = self.read_quat()?;
                let mut blend_weights = [0.0; 6];
                for w in &mut blend_weights {
                    *w = self.read_f32()?;
                }
                PacketBody::PlayerInfo(PlayerInf {
                    position,
                    rotation,
                    blend_weights,
                    act: self.read_i16()?,
                    sub_act: self.read_i16()?,
                })
            }
            PacketType::HackCapInfo => PacketBody::HackCapInfo(HackCapInf {
                position: self.read_vec3()?,
                rotation: self.read_quat()?,
                is_visible: self.read_bool()?,
                anim: self.read_str()?,
            }),
            PacketType::GameInfo => PacketBody::GameInfo(GameInf {
                is_2d: self.read_bool()?,
                scenario: self.read_u8()?,
                stage: self.read_str()?,
            }),
            PacketType::TagInfo => PacketBody::TagInfo(TagInf {
                update_type: self.read_u8()?,
                is_it: self.read_bool()?,
                seconds: self.read_u8()?,
                minutes: self.read_u16()?,
            }),
            PacketType::PlayerConnect => PacketBody::PlayerConnect(PlayerConnect {
                connection_type: ConnectionType::from_raw(self.read_i32()?),
                max_players: self.read_u16()?,
                client_name: self.read_str()?,
            }),
            PacketType::PlayerDisconnect => PacketBody::PlayerDisconnect,
            PacketType::CostumeInfo => PacketBody::CostumeInfo(CostumeInf {
                body: self.read_str()?,
                cap: self.read_str()?,
            }),
            PacketType::Check => PacketBody::Check(Check {
                location_id: self.read_i32()?,
                item_type: self.read_i32()?,
                index: self.read_i32()?,
                object_id: self.read_str()?,
                stage: self.read_str()?,
                amount: self.read_i32()?,
            }),
            PacketType::CaptureInfo => PacketBody::CaptureInfo(CaptureInf {
                hack_name: self.read_str()?,
            }),
            PacketType::ChangeStage => PacketBody::ChangeStage(ChangeStage {
                stage: self.read_str()?,
                entrance: self.read_str()?,
                scenario: self.read_i8()?,
                sub_scenario_type: self.read_u8()?,
            }),
            PacketType::Command => PacketBody::Command(ServerCommand {
                command: self.read_str()?,
            }),
            PacketType::ItemCollect => PacketBody::ItemCollect(ItemCollect {
                name: self.read_str()?,
                item_type: self.read_i32()?,
            }),
            PacketType::FillerCollect => PacketBody::FillerCollect(FillerCollect {
                item_type: self.read_i32()?,
            }),
            PacketType::ChatMessage => PacketBody::ChatMessage(ChatMessage {
                lines: [self.read_str()?, self.read_str()?, self.read_str()?],
            }),
            PacketType::SlotData => {
                let mut world_costs = [0u16; 13];
                for cost in &mut world_costs {
                    *cost = self.read_u16()?;
                }
                PacketBody::SlotData(SlotData {
                    world_costs,
                    regionals: self.read_bool()?,
                    captures: self.read_bool()?,
                })
            }
            PacketType::UnlockWorld => PacketBody::UnlockWorld(UnlockWorld {
                world_id: self.read_i32()?,
            }),
            PacketType::RegionalCollect => PacketBody::RegionalCollect(RegionalCollect {
                object_id: self.read_str()?,
                stage: self.read_str()?,
            }),
            PacketType::Deathlink => PacketBody::Deathlink,
            PacketType::Progress => PacketBody::Progress(Progress {
                world_id: self.read_i32()?,
                scenario: self.read_i32()?,
            }),
            PacketType::ShineChecks => {
                let mut checks = ShineChecks::default();
                for uid in &mut checks.uids {
                    *uid = self.read_i16()?;
                }
                PacketBody::ShineChecks(checks)
            }
            PacketType::ApInfo => PacketBody::ApInfo(ApInfo {
                info_type: self.read_i16()?,
                indices: [self.read_i16()?, self.read_i16()?, self.read_i16()?],
                names: [self.read_str()?, self.read_str()?, self.read_str()?],
            }),
            PacketType::ShopReplace => {
                let mut shop = ShopReplace {
                    kind: self.read_u8()?,
                    ..ShopReplace::default()
                };
                for entry in &mut shop.entries {
                    *entry = ShopEntry {
                        game_index: self.read_u8()?,
                        slot_index: self.read_u8()?,
                        item_index: self.read_u8()?,
                        classification: self.read_u8()?,
                    };
                }
                PacketBody::ShopReplace(shop)
            }
            PacketType::ShineReplace => {
                let mut replace = ShineReplace::default();
                for entry in &mut replace.entries {
                    *entry = ShineEntry {
                        item_type: self.read_u8()?,
                        name_index: self.read_u8()?,
                    };
                }
                PacketBody::ShineReplace(replace)
            }
            PacketType::UdpInit => PacketBody::UdpInit(UdpInit {
                port: self.read_u16()?,
            }),
            PacketType::HolePunch => PacketBody::HolePunch,
            PacketType::ShineColor => {
                let mut colors = ShineColor::default();
                for entry in &mut colors.entries {
                    *entry = ShineColorEntry {
                        uid: self.read_i16()?,
                        color: self.read_u8()?,
                    };
                }
                PacketBody::ShineColor(colors)
            }
        };
        Some(body)
    }

    /// Deserializes a complete packet (header and body) from the buffer.
    pub fn deserialize(&mut self) -> NetResult<Packet> {
        let header = self.read_header().ok_or(NetError::Truncated {
            needed: PacketHeader::SIZE,
            available: self.remaining(),
        })?;
        let payload_len = usize::from(header.payload_len);
        if payload_len > self.remaining() {
            return Err(NetError::Truncated {
                needed: payload_len,
                available: self.remaining(),
            });
        }
        let start = self.position;
        self.position += payload_len;
        decode_body(&header, &self.buffer[start..start + payload_len])
    }
}

/// One framed packet as read off a stream: header plus raw payload.
#[derive(Clone, Copy)]
pub struct Frame {
    /// Parsed header.
    pub header: PacketHeader,
    payload: [u8; MAX_PAYLOAD_SIZE],
}

impl Frame {
    /// Payload bytes, exactly `header.payload_len` long.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload[..usize::from(self.header.payload_len)]
    }

    /// Decodes the body.
    pub fn decode(&self) -> NetResult<Packet> {
        decode_body(&self.header, self.payload())
    }

    /// Frames one self-contained buffer, such as a datagram.
    ///
    /// A short buffer is a protocol fault here, not a closed connection.
    pub fn from_bytes(bytes: &[u8]) -> NetResult<Self> {
        let header = PacketDeserializer::new(bytes)
            .read_header()
            .ok_or(NetError::Truncated {
                needed: PacketHeader::SIZE,
                available: bytes.len(),
            })?;

        let payload_len = usize::from(header.payload_len);
        let available = bytes.len() - PacketHeader::SIZE;
        if payload_len > available {
            return Err(NetError::Truncated {
                needed: payload_len,
                available,
            });
        }
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(NetError::Oversized(payload_len));
        }

        let mut frame = Frame {
            header,
            payload: [0u8; MAX_PAYLOAD_SIZE],
        };
        frame.payload[..payload_len]
            .copy_from_slice(&bytes[PacketHeader::SIZE..PacketHeader::SIZE + payload_len]);
        Ok(frame)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

/// Reads one frame: 20 header bytes then exactly `payload_len` bytes.
///
/// A clean end of stream before the header is `ConnectionClosed`.
pub fn read_frame(reader: &mut impl Read) -> NetResult<Frame> {
    let mut raw = [0u8; PacketHeader::SIZE];
    if let Err(e) = reader.read_exact(&mut raw) {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => NetError::ConnectionClosed,
            _ => NetError::Io(e),
        });
    }

    let header = PacketDeserializer::new(&raw)
        .read_header()
        .ok_or(NetError::Truncated {
            needed: PacketHeader::SIZE,
            available: raw.len(),
        })?;

    let payload_len = usize::from(header.payload_len);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(NetError::Oversized(payload_len));
    }

    let mut frame = Frame {
        header,
        payload: [0u8; MAX_PAYLOAD_SIZE],
    };
    reader.read_exact(&mut frame.payload[..payload_len])?;
    Ok(frame)
}

/// Decodes a body against its header.
///
/// Unknown tags and length mismatches are protocol faults; the caller drops
/// the packet and keeps reading.
pub fn decode_body(header: &PacketHeader, payload: &[u8]) -> NetResult<Packet> {
    let packet_type = header
        .kind()
        .ok_or(NetError::UnknownPacketType(header.packet_type))?;

    let expected = packet_type.body_size();
    if payload.len() != expected {
        return Err(NetError::PayloadMismatch {
            packet_type: packet_type.name(),
            expected,
            actual: payload.len(),
        });
    }

    let body = PacketDeserializer::new(payload)
        .read_body(packet_type)
        .ok_or(NetError::Truncated {
            needed: expected,
            available: payload.len(),
        })?;

    Ok(Packet::new(header.owner, body))
}

/// Encodes a packet into an owned buffer.
pub fn encode(packet: &Packet) -> NetResult<Vec<u8>> {
    let mut serializer = PacketSerializer::new();
    if serializer.serialize(packet) {
        Ok(serializer.as_slice().to_vec())
    } else {
        Err(NetError::Oversized(packet.wire_size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bodies() -> Vec<PacketBody> {
        vec![
            PacketBody::ClientInit(Init { max_players: 8 }),
            PacketBody::PlayerInfo(PlayerInf::default()),
            PacketBody::HackCapInfo(HackCapInf::default()),
            PacketBody::GameInfo(GameInf::default()),
            PacketBody::TagInfo(TagInf::default()),
            PacketBody::PlayerConnect(PlayerConnect::default()),
            PacketBody::PlayerDisconnect,
            PacketBody::CostumeInfo(CostumeInf::default()),
            PacketBody::Check(Check::default()),
            PacketBody::CaptureInfo(CaptureInf::default()),
            PacketBody::ChangeStage(ChangeStage::default()),
            PacketBody::Command(ServerCommand::default()),
            PacketBody::ItemCollect(ItemCollect::default()),
            PacketBody::FillerCollect(FillerCollect::default()),
            PacketBody::ChatMessage(ChatMessage::default()),
            PacketBody::SlotData(SlotData::default()),
            PacketBody::UnlockWorld(UnlockWorld::default()),
            PacketBody::RegionalCollect(RegionalCollect::default()),
            PacketBody::Deathlink,
            PacketBody::Progress(Progress::default()),
            PacketBody::ShineChecks(ShineChecks::default()),
            PacketBody::ApInfo(ApInfo::default()),
            PacketBody::ShopReplace(ShopReplace::default()),
            PacketBody::ShineReplace(ShineReplace::default()),
            PacketBody::UdpInit(UdpInit::default()),
            PacketBody::HolePunch,
            PacketBody::ShineColor(ShineColor::default()),
        ]
    }

    #[test]
    fn test_every_body_writes_its_size() {
        let mut serializer = PacketSerializer::new();
        let bodies = sample_bodies();
        assert_eq!(bodies.len(), PacketType::ALL.len() - 1);

        for body in bodies {
            let packet = Packet::new(PlayerId::from_u128(7), body);
            assert!(serializer.serialize(&packet), "{:?}", body.packet_type());
            assert_eq!(serializer.len(), packet.wire_size(), "{:?}", body.packet_type());
        }
    }

    /// Every field set away from its default so a swapped or skipped field
    /// shows up as a mismatch.
    fn populated_bodies() -> Vec<PacketBody> {
        let mut shine_checks = ShineChecks::default();
        for (i, uid) in shine_checks.uids.iter_mut().enumerate() {
            *uid = i16::try_from(i * 37).unwrap();
        }

        let mut shop = ShopReplace { kind: 2, ..ShopReplace::default() };
        for (i, entry) in shop.entries.iter_mut().enumerate() {
            let i = u8::try_from(i).unwrap();
            *entry = ShopEntry {
                game_index: i,
                slot_index: i + 1,
                item_index: i + 2,
                classification: i % 4,
            };
        }

        let mut shine_replace = ShineReplace::default();
        for (i, entry) in shine_replace.entries.iter_mut().enumerate() {
            let i = u8::try_from(i).unwrap();
            *entry = ShineEntry {
                item_type: i % 5,
                name_index: i,
            };
        }

        let mut shine_color = ShineColor::default();
        for (i, entry) in shine_color.entries.iter_mut().enumerate() {
            *entry = ShineColorEntry {
                uid: i16::try_from(i).unwrap() * 11 - 3,
                color: u8::try_from(i % 7).unwrap(),
            };
        }

        let mut world_costs = [0u16; 13];
        for (i, cost) in world_costs.iter_mut().enumerate() {
            *cost = u16::try_from(i).unwrap() * 3 + 1;
        }

        vec![
            PacketBody::ClientInit(Init { max_players: 12 }),
            PacketBody::PlayerInfo(PlayerInf {
                position: Vec3::new(-4.5, 1200.0, 7.25),
                rotation: Quat::new(0.1, 0.2, 0.3, 0.9),
                blend_weights: [0.5, 0.25, 0.125, 1.0, 2.0, 3.0],
                act: 42,
                sub_act: 7,
            }),
            PacketBody::HackCapInfo(HackCapInf {
                position: Vec3::new(3.0, -9.0, 27.0),
                rotation: Quat::new(0.5, -0.5, 0.5, -0.5),
                is_visible: true,
                anim: FixedStr::new("FlyingWaitR"),
            }),
            PacketBody::GameInfo(GameInf {
                is_2d: true,
                scenario: 4,
                stage: FixedStr::new("ForestWorldHomeStage"),
            }),
            PacketBody::TagInfo(TagInf {
                update_type: TagInf::UPDATE_STATE | TagInf::UPDATE_TIME,
                is_it: true,
                seconds: 59,
                minutes: 321,
            }),
            PacketBody::PlayerConnect(PlayerConnect {
                connection_type: ConnectionType::Reconnect,
                max_players: 9,
                client_name: FixedStr::new("Cappy"),
            }),
            PacketBody::PlayerDisconnect,
            PacketBody::CostumeInfo(CostumeInf {
                body: FixedStr::new("MarioTuxedo"),
                cap: FixedStr::new("MarioTuxedoCap"),
            }),
            PacketBody::Check(Check {
                location_id: 1042,
                item_type: 3,
                index: 77,
                object_id: FixedStr::new("obj991"),
                stage: FixedStr::new("SeaWorldHomeStage"),
                amount: 250,
            }),
            PacketBody::CaptureInfo(CaptureInf {
                hack_name: FixedStr::new("Frog"),
            }),
            PacketBody::ChangeStage(ChangeStage {
                stage: FixedStr::new("SnowWorldHomeStage"),
                entrance: FixedStr::new("start"),
                scenario: -1,
                sub_scenario_type: 2,
            }),
            PacketBody::Command(ServerCommand {
                command: FixedStr::new("sendall"),
            }),
            PacketBody::ItemCollect(ItemCollect {
                name: FixedStr::new("Mario64"),
                item_type: 1,
            }),
            PacketBody::FillerCollect(FillerCollect { item_type: 6 }),
            PacketBody::ChatMessage(ChatMessage {
                lines: [
                    FixedStr::new("Luigi found"),
                    FixedStr::new("Power Moon"),
                    FixedStr::new("for Mario"),
                ],
            }),
            PacketBody::SlotData(SlotData {
                world_costs,
                regionals: true,
                captures: true,
            }),
            PacketBody::UnlockWorld(UnlockWorld { world_id: 11 }),
            PacketBody::RegionalCollect(RegionalCollect {
                object_id: FixedStr::new("obj305"),
                stage: FixedStr::new("CityWorldHomeStage"),
            }),
            PacketBody::Deathlink,
            PacketBody::Progress(Progress {
                world_id: 5,
                scenario: 3,
            }),
            PacketBody::ShineChecks(shine_checks),
            PacketBody::ApInfo(ApInfo {
                info_type: ApInfo::TYPE_ITEM,
                indices: [4, -1, 19],
                names: [
                    FixedStr::new("Bowser's Kingdom"),
                    FixedStr::new("Slot Two"),
                    FixedStr::new("Progressive Cap"),
                ],
            }),
            PacketBody::ShopReplace(shop),
            PacketBody::ShineReplace(shine_replace),
            PacketBody::UdpInit(UdpInit { port: 51_888 }),
            PacketBody::HolePunch,
            PacketBody::ShineColor(shine_color),
        ]
    }

    #[test]
    fn test_every_body_roundtrips() {
        let bodies = populated_bodies();
        assert_eq!(bodies.len(), PacketType::ALL.len() - 1);

        for body in bodies {
            let packet = Packet::new(PlayerId::from_u128(0xA11CE), body);
            let bytes = encode(&packet).unwrap();
            let decoded = Frame::from_bytes(&bytes).unwrap().decode().unwrap();
            assert_eq!(decoded, packet, "{:?}", body.packet_type());
        }
    }

    #[test]
    fn test_header_layout() {
        let packet = Packet::new(
            PlayerId::from_u128(0x0102),
            PacketBody::UdpInit(UdpInit { port: 0xBEEF }),
        );
        let bytes = encode(&packet).unwrap();

        assert_eq!(bytes.len(), PacketHeader::SIZE + 2);
        assert_eq!(&bytes[0..2], &[0x02, 0x01]);
        assert_eq!(&bytes[16..18], &(PacketType::UdpInit as i16).to_le_bytes());
        assert_eq!(&bytes[18..20], &2u16.to_le_bytes());
        assert_eq!(&bytes[20..22], &[0xEF, 0xBE]);
    }

    #[test]
    fn test_player_info_roundtrip() {
        let info = PlayerInf {
            position: Vec3::new(1.0, -2.5, 300.0),
            rotation: Quat::new(0.0, 0.7071, 0.0, 0.7071),
            blend_weights: [0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            act: 14,
            sub_act: -1,
        };
        let packet = Packet::new(PlayerId::from_u128(3), PacketBody::PlayerInfo(info));
        let bytes = encode(&packet).unwrap();

        let decoded = PacketDeserializer::new(&bytes).deserialize().unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_check_roundtrip_through_frame() {
        let check = Check {
            location_id: 218,
            item_type: -1,
            index: 4,
            object_id: FixedStr::new("obj123"),
            stage: FixedStr::new("SandWorldHomeStage"),
            amount: 0,
        };
        let packet = Packet::new(PlayerId::NIL, PacketBody::Check(check));
        let bytes = encode(&packet).unwrap();

        let frame = Frame::from_bytes(&bytes).unwrap();
        assert_eq!(frame.payload().len(), Check::SIZE);
        assert_eq!(frame.decode().unwrap(), packet);
    }

    #[test]
    fn test_unknown_type_consumes_payload() {
        let mut stream = Vec::new();
        let mut header = PacketHeader::new(PlayerId::NIL, PacketType::UdpInit);
        header.packet_type = 99;
        header.payload_len = 3;
        let mut serializer = PacketSerializer::new();
        assert!(serializer.write_header(&header));
        stream.extend_from_slice(serializer.as_slice());
        stream.extend_from_slice(&[1, 2, 3]);
        stream.extend_from_slice(
            &encode(&Packet::new(PlayerId::NIL, PacketBody::HolePunch)).unwrap(),
        );

        let mut reader = &stream[..];
        let first = read_frame(&mut reader).unwrap();
        assert!(matches!(first.decode(), Err(NetError::UnknownPacketType(99))));

        let second = read_frame(&mut reader).unwrap();
        assert_eq!(second.decode().unwrap().packet_type(), PacketType::HolePunch);
    }

    #[test]
    fn test_payload_mismatch() {
        let header = PacketHeader {
            owner: PlayerId::NIL,
            packet_type: PacketType::Progress as i16,
            payload_len: 4,
        };
        let err = decode_body(&header, &[0; 4]).unwrap_err();
        assert!(matches!(
            err,
            NetError::PayloadMismatch { expected: 8, actual: 4, .. }
        ));
        assert!(!err.is_transport_fault());
    }

    #[test]
    fn test_oversized_frame_is_transport_fault() {
        let header = PacketHeader {
            owner: PlayerId::NIL,
            packet_type: PacketType::Check as i16,
            payload_len: 0x1000,
        };
        let mut serializer = PacketSerializer::new();
        assert!(serializer.write_header(&header));

        let err = read_frame(&mut serializer.as_slice()).unwrap_err();
        assert!(matches!(err, NetError::Oversized(0x1000)));
        assert!(err.is_transport_fault());
    }

    #[test]
    fn test_eof_is_connection_closed() {
        let empty: &[u8] = &[];
        assert!(matches!(
            read_frame(&mut &empty[..]),
            Err(NetError::ConnectionClosed)
        ));
    }
}
