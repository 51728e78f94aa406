//! F1 24 telemetry source over Codemasters-style UDP.
//!
//! Listens on the game's "UDP Telemetry" output (default port 20777) and
//! merges two packet kinds into snapshots:
//!
//! - **Motion** (id 0): per-car G-forces and yaw/pitch/roll, used as-is
//!   (already in g and radians).
//! - **Car Telemetry** (id 6): speed (km/h, already scaled — unlike the
//!   0..1 throttle/brake fractions in the same packet), gear, engine rpm
//!   and the four tyre surface types.
//!
//! `on_curb` is any wheel reporting surface type 1 (rumble strip); the
//! side is estimated from lateral G because the packet does not carry it.
//!
//! Both packet kinds are little-endian with a shared 29-byte header.

use crate::{CurbSide, TelemetrySnapshot, TelemetrySource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

pub const DEFAULT_F1_PORT: u16 = 20777;
const MAX_PACKET_SIZE: usize = 2048;

const PACKET_ID_MOTION: u8 = 0;
const PACKET_ID_CAR_TELEMETRY: u8 = 6;

/// Header: packetFormat u16, gameYear/major/minor/packetVersion/packetId
/// u8×5, sessionUID u64, sessionTime f32, frameId u32, overallFrameId u32,
/// playerCarIndex u8, secondaryPlayerCarIndex u8.
const HEADER_SIZE: usize = 29;
const OFF_PACKET_ID: usize = 6;
const OFF_PLAYER_INDEX: usize = 27;

/// Per-car motion block: 6×f32 world pos/vel, 6×i16 direction vectors,
/// then g_lat, g_lon, g_vert, yaw, pitch, roll as f32.
const CAR_MOTION_SIZE: usize = 60;
const OFF_G_LAT: usize = 36;
const OFF_G_LON: usize = 40;
const OFF_G_VERT: usize = 44;
const OFF_YAW: usize = 48;
const OFF_PITCH: usize = 52;
const OFF_ROLL: usize = 56;

/// Per-car telemetry block (60 bytes): speed u16, throttle/steer/brake
/// f32, clutch u8, gear i8, rpm u16, drs u8, revLightsPercent u8,
/// revLightsBitValue u16, brakesTemp 4×u16, tyre temps 2×4×u8,
/// engineTemp u16, tyresPressure 4×f32, surfaceType 4×u8.
const CAR_TELEMETRY_SIZE: usize = 60;
const OFF_SPEED: usize = 0;
const OFF_GEAR: usize = 15;
const OFF_RPM: usize = 16;
const OFF_SURFACE_TYPES: usize = 56;

/// Surface type 1 is the rumble strip in the Codemasters surface table.
const SURFACE_RUMBLE_STRIP: u8 = 1;
/// Lateral-G magnitude above which the curb side stops being "center".
const CURB_SIDE_G_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
struct MotionSample {
    g_lat: f32,
    g_lon: f32,
    g_vert: f32,
    yaw: f32,
    pitch: f32,
    roll: f32,
}

#[derive(Debug, Clone, Copy)]
struct CarSample {
    speed_kmh: f32,
    gear: i8,
    rpm: u16,
    on_curb: bool,
}

/// UDP reader with last-known caches for the two packet kinds; a snapshot
/// is available once at least one Car Telemetry packet has arrived.
pub struct F1UdpSource {
    bind_port: u16,
    socket: Option<UdpSocket>,
    last_motion: Option<MotionSample>,
    last_car: Option<CarSample>,
}

impl F1UdpSource {
    pub fn new() -> Self {
        Self::with_port(DEFAULT_F1_PORT)
    }

    pub fn with_port(bind_port: u16) -> Self {
        Self {
            bind_port,
            socket: None,
            last_motion: None,
            last_car: None,
        }
    }

    /// Folds one datagram into the caches. Unknown packet ids and short
    /// packets are ignored, matching the game's fire-and-forget stream.
    fn ingest(&mut self, data: &[u8]) {
        if data.len() < HEADER_SIZE {
            return;
        }
        let Some(packet_id) = data.get(OFF_PACKET_ID).copied() else {
            return;
        };
        let player_index = usize::from(data.get(OFF_PLAYER_INDEX).copied().unwrap_or(0));

        match packet_id {
            PACKET_ID_MOTION => {
                let base = HEADER_SIZE + player_index * CAR_MOTION_SIZE;
                if let (Some(g_lat), Some(g_lon), Some(g_vert), Some(yaw), Some(pitch), Some(roll)) = (
                    read_f32(data, base + OFF_G_LAT),
                    read_f32(data, base + OFF_G_LON),
                    read_f32(data, base + OFF_G_VERT),
                    read_f32(data, base + OFF_YAW),
                    read_f32(data, base + OFF_PITCH),
                    read_f32(data, base + OFF_ROLL),
                ) {
                    self.last_motion = Some(MotionSample {
                        g_lat,
                        g_lon,
                        g_vert,
                        yaw,
                        pitch,
                        roll,
                    });
                }
            }
            PACKET_ID_CAR_TELEMETRY => {
                let base = HEADER_SIZE + player_index * CAR_TELEMETRY_SIZE;
                let (Some(speed), Some(gear), Some(rpm), Some(surfaces)) = (
                    read_u16(data, base + OFF_SPEED),
                    read_i8(data, base + OFF_GEAR),
                    read_u16(data, base + OFF_RPM),
                    data.get(base + OFF_SURFACE_TYPES..base + OFF_SURFACE_TYPES + 4),
                ) else {
                    return;
                };
                self.last_car = Some(CarSample {
                    speed_kmh: f32::from(speed),
                    gear,
                    rpm,
                    on_curb: surfaces.iter().any(|s| *s == SURFACE_RUMBLE_STRIP),
                });
            }
            other => {
                debug!(packet_id = other, "ignoring F1 packet kind");
            }
        }
    }

    fn snapshot(&self) -> Option<TelemetrySnapshot> {
        let car = self.last_car?;
        let motion = self.last_motion.unwrap_or_default();
        let curb_side = if self.last_motion.is_none() {
            CurbSide::Unknown
        } else if motion.g_lat < -CURB_SIDE_G_THRESHOLD {
            CurbSide::Left
        } else if motion.g_lat > CURB_SIDE_G_THRESHOLD {
            CurbSide::Right
        } else {
            CurbSide::Center
        };

        Some(TelemetrySnapshot {
            speed_kmh: car.speed_kmh,
            g_lat: motion.g_lat,
            g_lon: motion.g_lon,
            g_vert: motion.g_vert,
            yaw_rad: motion.yaw,
            pitch_rad: motion.pitch,
            roll_rad: motion.roll,
            gear: car.gear,
            rpm: car.rpm,
            on_curb: car.on_curb,
            curb_side,
        })
    }
}

impl Default for F1UdpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySource for F1UdpSource {
    fn game_id(&self) -> &str {
        "f1"
    }

    async fn start(&mut self) -> Result<()> {
        let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.bind_port));
        let socket = UdpSocket::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind F1 telemetry socket on {bind_addr}"))?;
        info!(port = self.bind_port, "F1 UDP telemetry source bound");
        self.socket = Some(socket);
        Ok(())
    }

    async fn read_snapshot(&mut self, budget: Duration) -> Result<Option<TelemetrySnapshot>> {
        // Taken out of the Option for the loop so receiving and ingesting
        // don't fight over `self`; put back before returning.
        let Some(socket) = self.socket.take() else {
            return Ok(None);
        };

        // Drain whatever arrives within the budget so both caches stay
        // fresh; the game sends motion and telemetry as separate packets.
        let deadline = tokio::time::Instant::now() + budget;
        let mut buf = [0u8; MAX_PACKET_SIZE];
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, socket.recv(&mut buf)).await {
                Ok(Ok(len)) => {
                    let datagram = buf.get(..len).unwrap_or_default();
                    self.ingest(datagram);
                }
                Ok(Err(error)) => {
                    warn!(error = %error, "F1 UDP receive error");
                    break;
                }
                Err(_) => break,
            }
        }
        self.socket = Some(socket);

        Ok(self.snapshot())
    }

    async fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            info!("F1 UDP telemetry source closed");
        }
        self.last_motion = None;
        self.last_car = None;
        Ok(())
    }
}

fn read_f32(buf: &[u8], offset: usize) -> Option<f32> {
    let bytes: [u8; 4] = buf.get(offset..offset + 4)?.try_into().ok()?;
    Some(f32::from_le_bytes(bytes))
}

fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes: [u8; 2] = buf.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

fn read_i8(buf: &[u8], offset: usize) -> Option<i8> {
    buf.get(offset).map(|byte| i8::from_le_bytes([*byte]))
}
