//! Shared memory region exchanged between the bus handler and the panel loop.
//!
//! The region is a 256-byte window with an auto-incrementing cursor, exactly
//! like a small I2C EEPROM. The host addresses it with the first byte of a
//! write, then streams data bytes which land at consecutive (wrapping)
//! offsets. Reads return the byte under the cursor and advance it.
//!
//! ```text
//!   host write:  [addr|tag] [d0] [d1] ... [dn]   STOP
//!                    │       │    │        │
//!                    ▼       ▼    ▼        ▼
//!   cursor:        start   start+1 ...  start+n+1 (mod 256)
//! ```
//!
//! Every cell is an atomic so the region can live in a `static` and be shared
//! by reference between interrupt context and thread mode. Only plain loads
//! and stores are used, which `portable-atomic` provides natively on
//! `thumbv6m`.
//!
//! # Ownership of fields
//!
//! | Field          | Written by                                   |
//! |----------------|----------------------------------------------|
//! | `bytes[1..]`   | bus handler                                  |
//! | `bytes[0]`     | bus handler (host writes), dispatch (mailbox) |
//! | `cursor`       | bus handler, dispatch (reset to 0 only)      |
//! | mailbox epoch  | dispatch                                     |
//! | `armed`        | bus handler                                  |
//! | bookkeeping    | bus handler                                  |
//!
//! The foreground never assumes a multi-byte read is atomic; see
//! [`SharedRegion::snapshot`].

use portable_atomic::{fence, AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};

/// Size of the shared region in bytes
pub const REGION_SIZE: usize = 256;

/// Offset of the outbound command mailbox
pub const MAILBOX_OFFSET: u8 = 0;

/// Summary of the last host write that carried at least one data byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WriteRecord {
    /// First byte of the transaction (raw address or version tag)
    pub tag: u8,
    /// Offset the first data byte landed at
    pub start: u8,
    /// Number of data bytes written (saturates at [`REGION_SIZE`])
    pub len: u16,
}

impl WriteRecord {
    /// Exclusive end offset of the write, without wrapping
    ///
    /// A write that wrapped past the end of the region reports
    /// [`REGION_SIZE`].
    pub fn end(&self) -> usize {
        (self.start as usize + self.len as usize).min(REGION_SIZE)
    }

    /// Whether the write covered every byte in `start..end`
    pub fn covers(&self, start: usize, end: usize) -> bool {
        start >= self.start as usize && end <= self.end()
    }
}

/// Consistent copy of the region taken while no transaction was in flight
#[derive(Clone)]
pub struct RegionSnapshot {
    /// Region contents
    pub bytes: [u8; REGION_SIZE],
    /// Last committed write, if the host has written anything yet
    pub last_write: Option<WriteRecord>,
    /// Transaction generation the copy belongs to
    pub generation: u32,
}

impl RegionSnapshot {
    /// Read a little-endian `u32` at `offset`
    pub fn u32_at(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ])
    }

    /// Read a little-endian `i32` at `offset`
    pub fn i32_at(&self, offset: usize) -> i32 {
        self.u32_at(offset) as i32
    }

    /// Read a little-endian `f32` at `offset`
    pub fn f32_at(&self, offset: usize) -> f32 {
        f32::from_bits(self.u32_at(offset))
    }
}

/// The shared memory region
pub struct SharedRegion {
    bytes: [AtomicU8; REGION_SIZE],
    cursor: AtomicU8,
    armed: AtomicBool,

    // Current transaction
    tag: AtomicU8,
    start: AtomicU8,
    written: AtomicU16,

    // Last committed write
    has_write: AtomicBool,
    last_tag: AtomicU8,
    last_start: AtomicU8,
    last_len: AtomicU16,

    generation: AtomicU32,
    mailbox_epoch: AtomicU32,
}

impl Default for SharedRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedRegion {
    /// Create a zeroed, unarmed region with the cursor at 0
    pub const fn new() -> Self {
        Self {
            bytes: [const { AtomicU8::new(0) }; REGION_SIZE],
            cursor: AtomicU8::new(0),
            armed: AtomicBool::new(false),
            tag: AtomicU8::new(0),
            start: AtomicU8::new(0),
            written: AtomicU16::new(0),
            has_write: AtomicBool::new(false),
            last_tag: AtomicU8::new(0),
            last_start: AtomicU8::new(0),
            last_len: AtomicU16::new(0),
            generation: AtomicU32::new(0),
            mailbox_epoch: AtomicU32::new(0),
        }
    }

    /// Current cursor position
    pub fn cursor(&self) -> u8 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Whether the addressing phase of a transaction has completed
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Number of transactions that have ended since power-up (wrapping)
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Number of times the mailbox has been posted (wrapping)
    pub fn mailbox_epoch(&self) -> u32 {
        self.mailbox_epoch.load(Ordering::Acquire)
    }

    /// Read a single byte without touching the cursor
    pub fn peek(&self, offset: u8) -> u8 {
        self.bytes[offset as usize].load(Ordering::Relaxed)
    }

    /// Begin the data phase of a transaction at `start`
    ///
    /// `tag` is the raw addressing byte the host sent.
    pub fn arm(&self, tag: u8, start: u8) {
        self.tag.store(tag, Ordering::Relaxed);
        self.start.store(start, Ordering::Relaxed);
        self.written.store(0, Ordering::Relaxed);
        self.cursor.store(start, Ordering::Release);
        self.armed.store(true, Ordering::Release);
        // Data stores must not be observed ahead of `armed`
        fence(Ordering::Release);
    }

    /// Store `byte` under the cursor and advance it
    pub fn write_next(&self, byte: u8) {
        let cursor = self.cursor.load(Ordering::Relaxed);
        self.bytes[cursor as usize].store(byte, Ordering::Relaxed);
        self.cursor.store(cursor.wrapping_add(1), Ordering::Release);

        let written = self.written.load(Ordering::Relaxed);
        if (written as usize) < REGION_SIZE {
            self.written.store(written + 1, Ordering::Relaxed);
        }
    }

    /// Return the byte under the cursor and advance it
    pub fn read_next(&self) -> u8 {
        let cursor = self.cursor.load(Ordering::Relaxed);
        let byte = self.bytes[cursor as usize].load(Ordering::Relaxed);
        self.cursor.store(cursor.wrapping_add(1), Ordering::Release);
        byte
    }

    /// Move the cursor back over `count` bytes that were produced but
    /// never clocked out on the bus
    ///
    /// `epoch` is the [`mailbox_epoch`](Self::mailbox_epoch) observed before
    /// the bytes were produced. If the mailbox was posted since, the cursor
    /// now belongs to the new command and is left alone; returns whether
    /// the cursor moved.
    ///
    /// Must not be pre-empted by [`post_mailbox`](Self::post_mailbox): call
    /// it from the bus context only.
    pub fn retract(&self, count: u8, epoch: u32) -> bool {
        if self.mailbox_epoch() != epoch {
            return false;
        }
        let cursor = self.cursor.load(Ordering::Relaxed);
        self.cursor.store(cursor.wrapping_sub(count), Ordering::Release);
        true
    }

    /// Close the current transaction
    ///
    /// Clears `armed` but leaves the cursor where the transaction left it.
    /// A transaction that wrote data is committed as the last write.
    pub fn finish(&self) {
        let written = self.written.load(Ordering::Relaxed);
        self.written.store(0, Ordering::Relaxed);
        if written > 0 {
            self.last_tag.store(self.tag.load(Ordering::Relaxed), Ordering::Relaxed);
            self.last_start
                .store(self.start.load(Ordering::Relaxed), Ordering::Relaxed);
            self.last_len.store(written, Ordering::Relaxed);
            self.has_write.store(true, Ordering::Relaxed);
        }

        let generation = self.generation.load(Ordering::Relaxed);
        self.generation
            .store(generation.wrapping_add(1), Ordering::Release);
        self.armed.store(false, Ordering::Release);
    }

    /// Place an outbound command byte in the mailbox and rewind the cursor
    pub fn post_mailbox(&self, byte: u8) {
        // Epoch first: a retract that sees the old epoch ran before the reseed
        let epoch = self.mailbox_epoch.load(Ordering::Relaxed);
        self.mailbox_epoch
            .store(epoch.wrapping_add(1), Ordering::Release);
        self.bytes[MAILBOX_OFFSET as usize].store(byte, Ordering::Relaxed);
        self.cursor.store(MAILBOX_OFFSET, Ordering::Release);
    }

    /// Copy the region if no transaction overlapped the copy
    ///
    /// Returns `None` when the region was armed at the start or end of the
    /// copy, or when a transaction ended in between. Callers retry on a later
    /// cycle; nothing here blocks.
    pub fn snapshot(&self) -> Option<RegionSnapshot> {
        if self.is_armed() {
            return None;
        }
        let generation = self.generation();

        let mut bytes = [0u8; REGION_SIZE];
        for (dst, src) in bytes.iter_mut().zip(self.bytes.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }

        let last_write = if self.has_write.load(Ordering::Relaxed) {
            Some(WriteRecord {
                tag: self.last_tag.load(Ordering::Relaxed),
                start: self.last_start.load(Ordering::Relaxed),
                len: self.last_len.load(Ordering::Relaxed),
            })
        } else {
            None
        };

        // Copy loads must complete before the re-check
        fence(Ordering::Acquire);
        if self.is_armed() || self.generation() != generation {
            return None;
        }

        Some(RegionSnapshot {
            bytes,
            last_write,
            generation,
        })
    }
}
