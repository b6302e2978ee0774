#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const UNIT_LEN: usize = 188;

/// A unit with a payload only adaptation field and `payload` padded with 0xff.
pub fn unit(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= UNIT_LEN - 4, "payload too large for one unit");
    let mut dat = vec![0xff; UNIT_LEN];
    dat[0] = 0x47;
    dat[1] = (if pusi { 0x40 } else { 0x00 }) | ((pid >> 8) as u8 & 0x1f);
    dat[2] = (pid & 0xff) as u8;
    dat[3] = 0x10 | (cc & 0x0f);
    dat[4..4 + payload.len()].copy_from_slice(payload);
    dat
}

/// A unit starting a section, i.e., with a zero pointer field.
pub fn section_unit(pid: u16, section: &[u8]) -> Vec<u8> {
    let mut payload = vec![0u8];
    payload.extend_from_slice(section);
    unit(pid, true, 0, &payload)
}

/// A long form section with version 1, current, section 0 of 0 and a zeroed CRC.
pub fn section(table_id: u8, extension: u16, data: &[u8]) -> Vec<u8> {
    let len = 5 + data.len() + 4;
    let mut dat = vec![
        table_id,
        0xb0 | (len >> 8) as u8,
        (len & 0xff) as u8,
        (extension >> 8) as u8,
        (extension & 0xff) as u8,
        0xc3,
        0x00,
        0x00,
    ];
    dat.extend_from_slice(data);
    dat.extend_from_slice(&[0u8; 4]);
    dat
}

pub fn pat_section(tsid: u16, programs: &[(u16, u16)]) -> Vec<u8> {
    let mut data = Vec::new();
    for (number, pid) in programs {
        data.extend_from_slice(&number.to_be_bytes());
        data.extend_from_slice(&(0xe000 | pid).to_be_bytes());
    }
    section(0x00, tsid, &data)
}

fn with_loop_len(dat: &mut Vec<u8>, descriptors: &[u8]) {
    dat.extend_from_slice(&(0xf000 | descriptors.len() as u16).to_be_bytes());
    dat.extend_from_slice(descriptors);
}

/// NIT actual with network descriptors and one transport stream entry.
pub fn nit_section(network_id: u16, descriptors: &[u8], ts_descriptors: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    with_loop_len(&mut data, descriptors);
    let mut ts = vec![0x00, 0x01, 0x00, 0x02];
    with_loop_len(&mut ts, ts_descriptors);
    with_loop_len(&mut data, &ts);
    section(0x40, network_id, &data)
}

/// EIT present/following actual with a single event.
pub fn eit_section(service_id: u16, start: &[u8; 5], descriptors: &[u8]) -> Vec<u8> {
    let mut data = vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x4e];
    data.extend_from_slice(&[0x00, 0x2a]);
    data.extend_from_slice(start);
    data.extend_from_slice(&[0x01, 0x30, 0x00]);
    let mut flags = vec![];
    with_loop_len(&mut flags, descriptors);
    flags[0] |= 0x80; // running
    flags[0] &= 0x8f;
    data.extend_from_slice(&flags);
    section(0x4e, service_id, &data)
}

pub fn hex_bytes(s: &str) -> Vec<u8> {
    hex::decode(s.replace(' ', "")).expect("valid hex literal")
}

/// Write `dat` to a temporary file that is removed on drop.
pub fn temp_stream(dat: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("creating temp file");
    file.write_all(dat).expect("writing temp file");
    file.flush().expect("flushing temp file");
    file
}
