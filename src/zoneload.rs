use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::{Path, PathBuf};

use corvid_proto::buffer::BytePacketBuffer;
use corvid_proto::{Name, RecordType, ResourceRecord};

/// One `*.toml` file per apex. The wire syntax and file layout are an
/// external concern; this is one reasonable shape, not a format the core
/// resolver cares about.
#[derive(Debug, serde::Deserialize)]
struct ZoneFile {
    apex: String,
    #[serde(default, rename = "record")]
    records: Vec<ZoneFileRecord>,
}

#[derive(Debug, serde::Deserialize)]
struct ZoneFileRecord {
    name: String,
    #[serde(rename = "type")]
    rtype: String,
    ttl: u32,
    value: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ZoneLoadError {
    #[error("couldn't read zone file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse zone file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid owner name {name:?} in {path}: {source}")]
    InvalidName {
        path: PathBuf,
        name: String,
        #[source]
        source: corvid_proto::NameError,
    },
    #[error("unsupported record type {rtype:?} for {name:?} in {path}")]
    UnsupportedType {
        path: PathBuf,
        name: String,
        rtype: String,
    },
    #[error("invalid value {value:?} for {rtype} record {name:?} in {path}")]
    InvalidValue {
        path: PathBuf,
        name: String,
        rtype: String,
        value: String,
    },
}

/// Loads every `*.toml` file directly under `dir`, returning one
/// `(apex, records)` pair per file, ready to feed to [`crate::zone::ZoneStore::put_zone`].
pub fn load_zone_dir(dir: &Path) -> Result<Vec<(Name, Vec<ResourceRecord>)>, ZoneLoadError> {
    let mut zones = Vec::new();
    let entries = fs::read_dir(dir).map_err(|source| ZoneLoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ZoneLoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        zones.push(load_zone_file(&path)?);
    }

    Ok(zones)
}

fn load_zone_file(path: &Path) -> Result<(Name, Vec<ResourceRecord>), ZoneLoadError> {
    let content = fs::read_to_string(path).map_err(|source| ZoneLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ZoneFile = toml::from_str(&content).map_err(|source| ZoneLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let apex = Name::parse(&parsed.apex).map_err(|source| ZoneLoadError::InvalidName {
        path: path.to_path_buf(),
        name: parsed.apex.clone(),
        source,
    })?;

    let mut records = Vec::with_capacity(parsed.records.len());
    for entry in &parsed.records {
        records.push(to_resource_record(path, entry)?);
    }

    Ok((apex, records))
}

fn to_resource_record(
    path: &Path,
    entry: &ZoneFileRecord,
) -> Result<ResourceRecord, ZoneLoadError> {
    let name = Name::parse(&entry.name).map_err(|source| ZoneLoadError::InvalidName {
        path: path.to_path_buf(),
        name: entry.name.clone(),
        source,
    })?;

    let invalid_value = || ZoneLoadError::InvalidValue {
        path: path.to_path_buf(),
        name: entry.name.clone(),
        rtype: entry.rtype.clone(),
        value: entry.value.clone(),
    };

    let (rtype, data, text) = match entry.rtype.to_ascii_uppercase().as_str() {
        "A" => {
            let addr: Ipv4Addr = entry.value.parse().map_err(|_| invalid_value())?;
            (RecordType::A, addr.octets().to_vec(), entry.value.clone())
        }
        "AAAA" => {
            let addr: Ipv6Addr = entry.value.parse().map_err(|_| invalid_value())?;
            (RecordType::Aaaa, addr.octets().to_vec(), entry.value.clone())
        }
        "CNAME" => (RecordType::Cname, encode_qname(&entry.value), entry.value.clone()),
        "NS" => (RecordType::Ns, encode_qname(&entry.value), entry.value.clone()),
        "PTR" => (RecordType::Ptr, encode_qname(&entry.value), entry.value.clone()),
        "MX" => {
            let (priority, exchange) = entry.value.split_once(' ').ok_or_else(invalid_value)?;
            let priority: u16 = priority.parse().map_err(|_| invalid_value())?;
            let mut data = priority.to_be_bytes().to_vec();
            data.extend(encode_qname(exchange));
            (RecordType::Mx, data, entry.value.clone())
        }
        "TXT" => (RecordType::Txt, entry.value.as_bytes().to_vec(), entry.value.clone()),
        other => {
            return Err(ZoneLoadError::UnsupportedType {
                path: path.to_path_buf(),
                name: entry.name.clone(),
                rtype: other.to_string(),
            })
        }
    };

    Ok(ResourceRecord::authoritative(name, rtype, entry.ttl, data, Some(text)))
}

fn encode_qname(name: &str) -> Vec<u8> {
    let mut buffer = BytePacketBuffer::new();
    buffer
        .write_qname(name)
        .expect("zone file qname always fits in a fresh 512-byte buffer");
    buffer.as_slice().to_vec()
}
