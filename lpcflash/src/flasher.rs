//! The programming session: synchronization, identification and the
//! sector download state machine.
//!
//! One [`Flasher`] owns the serial port for the whole session. Commands
//! are strictly ordered; the boot ROM has no correlation ids, so every
//! answer is matched purely by arrival order. Sector 0 is always written
//! last: it carries the patched vector checksum, and erasing it first
//! keeps an interrupted download recoverable through ISP.

use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::device::{self, DeviceDescriptor, EffectiveDescriptor};
use crate::error::{Error, Result};
use crate::framing::Framer;
use crate::image::Image;
use crate::port::Port;
use crate::protocol::{BootStatus, Command, return_code, uuencode};
use crate::reset::{self, ControlLines};

/// Timeout for one `?` probe during synchronization.
const SYNC_TIMEOUT: Duration = Duration::from_millis(100);
/// Timeout for the handshake exchanges right after synchronization.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(1000);
/// Timeout for ordinary command answers and data echoes.
const ANSWER_TIMEOUT: Duration = Duration::from_millis(5000);
/// Timeout for the optional second identification word.
const SECOND_WORD_TIMEOUT: Duration = Duration::from_millis(500);
/// Upper bound for any single framed answer.
const ANSWER_MAX: usize = 512;
/// Send attempts per 20-line checksum group.
const GROUP_ATTEMPTS: u32 = 3;
/// Data lines are staged to RAM in blocks of this many bytes.
const BLOCK_BYTES: usize = uuencode::LINE_BYTES * 4;

/// Policy knobs for one programming session.
#[derive(Debug, Clone)]
pub struct FlashOptions {
    /// Crystal frequency in kHz, sent verbatim during the handshake.
    pub osc_khz: String,
    /// Erase the whole device up front instead of sector by sector.
    pub wipe: bool,
    /// Compare each chunk after copying it to flash.
    pub verify: bool,
    /// Leave the bootloader running instead of starting the program.
    pub no_start: bool,
    /// Control line wiring for hardware reset into ISP mode.
    pub control: ControlLines,
    /// How many `?` probes to send before giving up.
    pub sync_attempts: u32,
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            osc_khz: "10000".to_string(),
            wipe: false,
            verify: false,
            no_start: false,
            control: ControlLines::default(),
            sync_attempts: 100,
        }
    }
}

/// Identity read from the target during [`Flasher::connect`].
#[derive(Debug, Clone)]
pub struct DetectedDevice {
    /// Primary part identification word.
    pub id: u32,
    /// Secondary identification word, when the part reports one.
    pub id2: Option<u32>,
    /// Boot code version as `major.minor`, or `unknown`.
    pub boot_version: String,
    /// Catalog entry matched against the identification words.
    pub device: &'static DeviceDescriptor,
}

/// A programming session over one serial port.
pub struct Flasher<P: Port> {
    port: P,
    framer: Framer,
    options: FlashOptions,
    detected: Option<DetectedDevice>,
}

/// Fold an answer into comparable text: CR and CR LF become LF, bytes
/// with the high bit set (EOF markers on a dying connection) vanish,
/// and leading line breaks are dropped.
fn normalize(answer: &[u8]) -> String {
    let mut out = String::new();
    for &b in answer {
        if b & 0x80 != 0 {
            continue;
        }
        let c = if b == b'\r' { '\n' } else { char::from(b) };
        if c == '\n' && out.ends_with('\n') {
            continue;
        }
        out.push(c);
    }
    while out.starts_with('\n') {
        out.remove(0);
    }
    out
}

impl<P: Port> Flasher<P> {
    /// Create a session over `port` with the given policy.
    pub fn new(port: P, options: FlashOptions) -> Self {
        Self {
            port,
            framer: Framer::new(),
            options,
            detected: None,
        }
    }

    /// Identity of the target, once [`Flasher::connect`] has succeeded.
    #[must_use]
    pub fn detected(&self) -> Option<&DetectedDevice> {
        self.detected.as_ref()
    }

    /// Reset the target out of the bootloader so the application runs.
    pub fn reset_to_run(&mut self) -> Result<()> {
        reset::reset_to_run(&mut self.port, self.options.control)
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn send(&mut self, cmd: &Command) -> Result<()> {
        trace!("-> {cmd}");
        self.port.write_all(cmd.text().as_bytes())?;
        self.port.write_all(b"\r\n")?;
        self.port.flush()?;
        Ok(())
    }

    /// Receive one framed answer, treating a timeout as a short answer
    /// so the caller can still inspect what arrived.
    fn receive_lenient(&mut self, wanted_breaks: usize, timeout: Duration) -> Result<Vec<u8>> {
        match self
            .framer
            .receive(&mut self.port, ANSWER_MAX, wanted_breaks, timeout)
        {
            Ok(answer) => Ok(answer),
            Err(Error::Incomplete { received }) => Ok(received),
            Err(e) => Err(e),
        }
    }

    /// Send a command and require the echo plus a `0` status line.
    ///
    /// Any other answer is folded into `err` with the status code the
    /// target reported (255 when no code could be parsed).
    fn send_and_verify(&mut self, cmd: &Command, err: fn(BootStatus) -> Error) -> Result<()> {
        self.send(cmd)?;
        let answer = self.receive_lenient(2, ANSWER_TIMEOUT)?;
        let expected = format!("{}\n0\n", cmd.text());
        if normalize(&answer) == expected {
            Ok(())
        } else {
            debug!("rejected: {cmd}");
            Err(err(BootStatus::from_code(return_code(&answer))))
        }
    }

    /// Bring the target into ISP mode and identify it.
    ///
    /// Runs the autobaud synchronization, the `Synchronized` and
    /// oscillator handshakes, unlocks the flash commands and reads the
    /// boot code version and part identification.
    pub fn connect(&mut self) -> Result<&DetectedDevice> {
        self.framer.clear();
        self.port.clear_buffers()?;
        self.synchronize()?;
        self.handshake()?;
        self.send_and_verify(&Command::Unlock, Error::Unlock)?;
        let boot_version = self.read_boot_version()?;
        let (id, id2) = self.read_part_id()?;
        let device = device::lookup(id, id2).ok_or(Error::UnknownDevice { id })?;
        info!(
            "found LPC{}, {} KiB flash, {} KiB RAM, boot code {boot_version}",
            device.name, device.flash_kib, device.ram_kib
        );
        Ok(&*self.detected.insert(DetectedDevice {
            id,
            id2,
            boot_version,
            device,
        }))
    }

    /// Autobaud synchronization: probe with `?` until the target answers
    /// `Synchronized`, resetting it between attempts when control lines
    /// are wired. This is the only place where cancellation is polled;
    /// once sectors are being written the session runs to completion.
    fn synchronize(&mut self) -> Result<()> {
        reset::enter_isp(&mut self.port, self.options.control)?;
        for attempt in 0..self.options.sync_attempts {
            if crate::is_interrupted_requested() {
                return Err(Error::UserAbort);
            }
            self.send_raw(b"?")?;
            match self
                .framer
                .receive(&mut self.port, ANSWER_MAX, 1, SYNC_TIMEOUT)
            {
                Ok(answer) => {
                    // Echoed probes and NUL noise precede the answer at
                    // mismatched baud rates.
                    let cleaned: Vec<u8> = answer
                        .iter()
                        .copied()
                        .filter(|&b| b != b'?' && b != 0)
                        .collect();
                    if normalize(&cleaned).contains("Synchronized") {
                        debug!("synchronized after {} attempts", attempt + 1);
                        return Ok(());
                    }
                }
                Err(Error::Incomplete { .. }) => {}
                Err(e) => return Err(e),
            }
            trace!("no sync answer, attempt {}", attempt + 1);
            reset::enter_isp(&mut self.port, self.options.control)?;
        }
        Err(Error::SyncNoAnswer)
    }

    fn handshake(&mut self) -> Result<()> {
        self.send(&Command::Confirm)?;
        let answer = self.receive_lenient(2, HANDSHAKE_TIMEOUT)?;
        if normalize(&answer) != "Synchronized\nOK\n" {
            return Err(Error::SyncHandshake);
        }
        let freq = self.options.osc_khz.clone();
        self.send(&Command::Oscillator(freq.clone()))?;
        let answer = self.receive_lenient(2, HANDSHAKE_TIMEOUT)?;
        if normalize(&answer) != format!("{freq}\nOK\n") {
            return Err(Error::Oscillator);
        }
        Ok(())
    }

    /// The version arrives as two lines after the status, minor first.
    fn read_boot_version(&mut self) -> Result<String> {
        self.send(&Command::ReadBootVersion)?;
        let answer = self.receive_lenient(4, ANSWER_TIMEOUT)?;
        let text = normalize(&answer);
        let mut lines = text.lines();
        if lines.next() != Some("K") {
            return Err(Error::BootVersion);
        }
        if lines.next() != Some("0") {
            warn!("boot code version not available");
            return Ok("unknown".to_string());
        }
        let minor = lines.next();
        let major = lines.next();
        Ok(match (major, minor) {
            (Some(major), Some(minor)) => format!("{}.{}", major.trim(), minor.trim()),
            _ => "unknown".to_string(),
        })
    }

    fn read_part_id(&mut self) -> Result<(u32, Option<u32>)> {
        self.send(&Command::ReadPartId)?;
        let answer = self.receive_lenient(3, ANSWER_TIMEOUT)?;
        let text = normalize(&answer);
        let mut lines = text.lines();
        if lines.next() != Some("J") || lines.next() != Some("0") {
            return Err(Error::PartId);
        }
        let id: u32 = lines
            .next()
            .and_then(|line| line.trim().parse().ok())
            .ok_or(Error::PartId)?;
        debug!("part id {id} ({id:#010x})");

        // Some parts report a second word on the next line; it may still
        // be in flight, so ask for one more line break.
        let id2 = if device::wants_second_word(id) {
            match self
                .framer
                .receive(&mut self.port, ANSWER_MAX, 1, SECOND_WORD_TIMEOUT)
            {
                Ok(extra) => normalize(&extra)
                    .lines()
                    .next()
                    .and_then(|line| line.trim().parse().ok()),
                Err(Error::Incomplete { .. }) => None,
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        Ok((id, id2))
    }

    /// Download `image` to the target.
    ///
    /// Flash targets get the vector checksum patched, sector 0 erased
    /// first and written last, and each sector staged through RAM in
    /// chunks of the device's max copy size. RAM targets are written as
    /// one giant sector, skipping erase, copy and the run answer check.
    /// A rejected answer to the final run command is only logged, since
    /// the image is already committed when it is issued.
    ///
    /// `progress` is called with `(bytes_done, bytes_total)`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn program(
        &mut self,
        image: &mut Image,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<()> {
        let device: &'static DeviceDescriptor = self
            .detected
            .as_ref()
            .ok_or(Error::NotConnected)?
            .device;
        let family = device.family;
        let geometry = EffectiveDescriptor::derive(device, image.offset, image.len());
        let bank = (!geometry.ram_target && family.has_flash_banks()).then_some(0);

        if !geometry.ram_target {
            image.patch_vector_checksum(family.vector_table_offset());
        }
        // RAM images skip the bytes overlapping the ISP work area; the
        // staging address already sits above it.
        let source_shift = if geometry.ram_target {
            (family.ram_base() - family.ram_start()) as usize
        } else {
            0
        };

        let total = image.len();
        let max_copy = geometry.max_copy_size as usize;
        let ram_base = family.ram_base();
        let mut done = 0usize;
        progress(0, total);

        // Invalidate the checksum sector before touching anything else,
        // so an interrupted download leaves the part re-enterable.
        if !geometry.ram_target {
            if self.options.wipe {
                let last = geometry.sector_count as u32 - 1;
                self.send_and_verify(&Command::Prepare { start: 0, end: last, bank }, Error::Prepare)?;
                self.send_and_verify(&Command::Erase { start: 0, end: last, bank }, Error::Erase)?;
                info!("erased all {} sectors", geometry.sector_count);
            } else {
                self.send_and_verify(&Command::Prepare { start: 0, end: 0, bank }, Error::Prepare)?;
                self.send_and_verify(&Command::Erase { start: 0, end: 0, bank }, Error::Erase)?;
            }
        }

        let mut sector: usize;
        let mut sector_start: usize;
        if geometry.sectors[0] as usize >= total {
            sector = 0;
            sector_start = 0;
        } else {
            sector = 1;
            sector_start = geometry.sectors[0] as usize;
        }

        loop {
            if sector >= geometry.sector_count || sector >= geometry.sectors.len() {
                return Err(Error::ProgramTooLarge);
            }
            let mut sector_length = geometry.sectors[sector] as usize;
            if sector_start + sector_length > total {
                sector_length = total - sector_start;
            }
            debug!("sector {sector}: {sector_length} bytes at {sector_start:#x}");

            let blank = !geometry.ram_target
                && image.data[sector_start..sector_start + sector_length]
                    .iter()
                    .all(|&b| b == 0xFF);

            if blank {
                info!("sector {sector} is blank, skipping");
                done += sector_length;
                progress(done.min(total), total);
            } else {
                if !geometry.ram_target {
                    let sector32 = sector as u32;
                    self.send_and_verify(
                        &Command::Prepare { start: sector32, end: sector32, bank },
                        Error::Prepare,
                    )?;
                    // Sector 0 was erased up front in either policy.
                    if !self.options.wipe && sector != 0 {
                        self.send_and_verify(
                            &Command::Erase { start: sector32, end: sector32, bank },
                            Error::Erase,
                        )?;
                    }
                }

                let mut sector_offset = 0usize;
                while sector_offset < sector_length {
                    let chunk = (sector_length - sector_offset).min(max_copy);
                    // Stage whole 45-byte lines; up to 179 bytes of slack
                    // reach RAM but never flash.
                    let mut copy_length = chunk;
                    if copy_length % BLOCK_BYTES != 0 {
                        copy_length += BLOCK_BYTES - copy_length % BLOCK_BYTES;
                    }

                    self.send_and_verify(
                        &Command::WriteToRam {
                            addr: ram_base,
                            len: copy_length as u32,
                        },
                        Error::WriteAnnounce,
                    )?;
                    self.transfer_chunk(
                        image,
                        sector_start + sector_offset,
                        copy_length,
                        source_shift,
                    )?;

                    if !geometry.ram_target {
                        let sector32 = sector as u32;
                        self.send_and_verify(
                            &Command::Prepare { start: sector32, end: sector32, bank },
                            Error::PrepareBeforeCopy,
                        )?;
                        // The ROM only accepts a fixed set of copy sizes.
                        let rounded = if copy_length < 512 {
                            512
                        } else if sector_length < 1024 {
                            1024
                        } else if sector_length < 4096 {
                            4096
                        } else {
                            8192
                        };
                        copy_length = rounded.min(max_copy);
                        let flash_addr =
                            image.offset + (sector_start + sector_offset) as u32;
                        self.send_and_verify(
                            &Command::Copy {
                                flash: flash_addr,
                                ram: ram_base,
                                len: copy_length as u32,
                            },
                            Error::Copy,
                        )?;

                        if self.options.verify {
                            // The first 64 bytes are remapped onto the boot
                            // sector and would compare against the wrong data.
                            let cmd = if flash_addr < 64 {
                                let skip = 64 - flash_addr;
                                Command::Compare {
                                    addr: 64,
                                    ram: ram_base + skip,
                                    len: copy_length as u32 - skip,
                                }
                            } else {
                                Command::Compare {
                                    addr: flash_addr,
                                    ram: ram_base,
                                    len: copy_length as u32,
                                }
                            };
                            self.send_and_verify(&cmd, Error::Copy)?;
                        }
                    }

                    sector_offset += chunk;
                    done += chunk;
                    progress(done.min(total), total);
                }
            }

            if sector_start + sector_length >= total && sector != 0 {
                // Everything else is committed; write the checksum
                // sector last so the image only now becomes bootable.
                sector = 0;
                sector_start = 0;
            } else if sector == 0 {
                break;
            } else {
                sector_start += geometry.sectors[sector] as usize;
                sector += 1;
            }
        }

        if bank.is_some() {
            self.send_and_verify(&Command::SelectBank(0), Error::SelectBank)?;
        }

        if self.options.no_start {
            info!("download finished, leaving the bootloader running");
        } else {
            // Every sector is committed at this point; a garbled or missing
            // run answer only means the confirmation was lost.
            match self.run_new_code(image, geometry.ram_target) {
                Ok(()) => info!("download finished, new code launched"),
                Err(Error::Run(status)) => {
                    warn!("run command not confirmed ({status}); the image is committed");
                },
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Stream `copy_length` staged bytes starting at image index `base`
    /// as uuencoded lines with 20-line checksum groups.
    fn transfer_chunk(
        &mut self,
        image: &Image,
        base: usize,
        copy_length: usize,
        source_shift: usize,
    ) -> Result<()> {
        let mut group: Vec<Vec<u8>> = Vec::with_capacity(uuencode::LINES_PER_GROUP);
        let mut sum: u32 = 0;
        let mut pos = 0usize;
        while pos < copy_length {
            let chunk: Vec<u8> = (0..uuencode::LINE_BYTES)
                .map(|i| image.staged_byte(base + pos + i + source_shift))
                .collect();
            sum = sum.wrapping_add(uuencode::byte_sum(&chunk));
            let mut line = uuencode::encode_line(&chunk);
            line.extend_from_slice(b"\r\n");
            self.send_raw(&line)?;
            self.absorb_echo(&line)?;
            group.push(line);
            pos += uuencode::LINE_BYTES;

            if group.len() == uuencode::LINES_PER_GROUP {
                self.confirm_group(&group, sum, false)?;
                group.clear();
                sum = 0;
            }
        }
        if !group.is_empty() {
            self.confirm_group(&group, sum, true)?;
        }
        Ok(())
    }

    /// The target echoes every data line. The line may be swallowed on a
    /// half-duplex wire, so a missing echo is tolerated; a present but
    /// different echo is not.
    fn absorb_echo(&mut self, line: &[u8]) -> Result<()> {
        match self
            .framer
            .receive(&mut self.port, ANSWER_MAX, 1, ANSWER_TIMEOUT)
        {
            Ok(echo) => {
                let sent = normalize(line);
                if !normalize(&echo).starts_with(sent.trim_end_matches('\n')) {
                    return Err(Error::DataEcho);
                }
                Ok(())
            }
            Err(Error::Incomplete { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Send the group checksum and wait for `OK`; on mismatch resend the
    /// whole group verbatim, up to [`GROUP_ATTEMPTS`] checksum rounds.
    fn confirm_group(&mut self, group: &[Vec<u8>], sum: u32, final_group: bool) -> Result<()> {
        for attempt in 0..GROUP_ATTEMPTS {
            if attempt > 0 {
                warn!("checksum rejected, resending group (attempt {})", attempt + 1);
                for line in group {
                    self.send_raw(line)?;
                    self.absorb_echo(line)?;
                }
            }
            self.send_raw(format!("{sum}\r\n").as_bytes())?;
            let answer = self.receive_lenient(2, ANSWER_TIMEOUT)?;
            if normalize(&answer) == format!("{sum}\nOK\n") {
                return Ok(());
            }
        }
        Err(if final_group {
            Error::FinalGroupChecksum
        } else {
            Error::GroupChecksum
        })
    }

    /// Issue the run command. Flash targets still answer through the
    /// bootloader; the reply is often cut off (or followed by output of
    /// the started program), so only the expected prefix is required.
    fn run_new_code(&mut self, image: &Image, ram_target: bool) -> Result<()> {
        let device: &'static DeviceDescriptor = self
            .detected
            .as_ref()
            .ok_or(Error::NotConnected)?
            .device;
        let thumb = device.family.thumb_mode();
        let addr = if thumb {
            image.start_address & !1
        } else {
            image.start_address
        };
        let cmd = Command::Go { addr, thumb };
        self.send(&cmd)?;
        if ram_target {
            return Ok(());
        }
        let answer = self.receive_lenient(2, ANSWER_TIMEOUT)?;
        let expected = format!("{}\n0", cmd.text());
        let text = normalize(&answer);
        if text.is_empty() || !text.starts_with(&expected) {
            return Err(Error::Run(BootStatus::from_code(return_code(&answer))));
        }
        Ok(())
    }
}
