//! The facade's configuration surface: a small value type plus a
//! hand-written `key = value` parser — a flat constants/options module
//! rather than a generic config-file framework.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Configuration consumed by [`crate::system::MemorySystem`] and its
/// collaborators. A default instance is valid: single channel, single
/// subarray, prefetching and tracing disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    pub mat_height: Option<u32>,
    pub rows: u32,
    pub cols: u32,
    pub banks: u32,
    pub ranks: u32,
    pub channels: u32,
    pub address_mapping_scheme: String,
    pub decoder: Option<String>,
    /// One slot per channel; `Some(path)` overrides that channel's config.
    pub channel_config_paths: Vec<Option<String>>,
    pub mem_ctl: String,
    /// `"none"` disables prefetching.
    pub memory_prefetcher: String,
    pub prefetch_buffer_size: usize,
    pub pre_trace_file: Option<String>,
    pub pre_trace_writer: Option<String>,
    pub print_pre_trace: bool,
    pub echo_pre_trace: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            mat_height: None,
            rows: 16384,
            cols: 1024,
            banks: 8,
            ranks: 1,
            channels: 1,
            address_mapping_scheme: "ChannelRankBankRowColumn".to_string(),
            decoder: None,
            channel_config_paths: vec![None],
            mem_ctl: "OpenRow".to_string(),
            memory_prefetcher: "none".to_string(),
            prefetch_buffer_size: 8,
            pre_trace_file: None,
            pre_trace_writer: None,
            print_pre_trace: false,
            echo_pre_trace: false,
        }
    }
}

impl MemoryConfig {
    /// Parses `key = value` lines. Blank lines and `#`-prefixed comment lines
    /// are ignored. Unrecognized keys are kept only implicitly — this parser
    /// only tracks the fields in [`MemoryConfig`], matching §6's enumerated
    /// option list.
    pub fn parse(text: &str) -> Result<MemoryConfig, ConfigError> {
        let mut config = MemoryConfig::default();
        let mut channel_paths: Vec<(u32, String)> = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::MalformedLine {
                line_no,
                line: raw_line.to_string(),
            })?;
            let key = key.trim();
            let value = value.trim();

            if let Some(suffix) = key.strip_prefix("CONFIG_CHANNEL") {
                let index: u32 = suffix.parse().map_err(|_| ConfigError::InvalidNumber {
                    key: key.to_string(),
                    value: suffix.to_string(),
                })?;
                channel_paths.push((index, value.to_string()));
                continue;
            }

            match key {
                "MATHeight" => config.mat_height = Some(parse_num(key, value)?),
                "ROWS" => config.rows = parse_num(key, value)?,
                "COLS" => config.cols = parse_num(key, value)?,
                "BANKS" => config.banks = parse_num(key, value)?,
                "RANKS" => config.ranks = parse_num(key, value)?,
                "CHANNELS" => config.channels = parse_num(key, value)?,
                "AddressMappingScheme" => config.address_mapping_scheme = value.to_string(),
                "Decoder" => config.decoder = Some(value.to_string()),
                "MEM_CTL" => config.mem_ctl = value.to_string(),
                "MemoryPrefetcher" => config.memory_prefetcher = value.to_string(),
                "PrefetchBufferSize" => config.prefetch_buffer_size = parse_num(key, value)?,
                "PreTraceFile" => config.pre_trace_file = Some(value.to_string()),
                "PreTraceWriter" => config.pre_trace_writer = Some(value.to_string()),
                "PrintPreTrace" => config.print_pre_trace = parse_bool(key, value)?,
                "EchoPreTrace" => config.echo_pre_trace = parse_bool(key, value)?,
                _ => {
                    // Unknown keys are ignored: collaborators not modeled by
                    // this crate may still read their own config lines.
                }
            }
        }

        if !channel_paths.is_empty() {
            config.channel_config_paths = vec![None; config.channels as usize];
            for (index, path) in channel_paths {
                if let Some(slot) = config.channel_config_paths.get_mut(index as usize) {
                    *slot = Some(path);
                }
            }
        }

        Ok(config)
    }

    /// Reads `path`, parses it, and resolves `channel_config_paths`/
    /// `pre_trace_file` relative to `path`'s directory unless already absolute.
    pub fn from_path(path: impl AsRef<Path>) -> Result<MemoryConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::MalformedLine { line_no: 0, line: e.to_string() })?;
        let mut config = MemoryConfig::parse(&text)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for slot in config.channel_config_paths.iter_mut() {
            if let Some(p) = slot {
                *p = resolve_relative(base_dir, p);
            }
        }
        if let Some(p) = &config.pre_trace_file {
            config.pre_trace_file = Some(resolve_relative(base_dir, p));
        }

        Ok(config)
    }

    /// Serializes back to `key = value` text. Round-trips through
    /// [`MemoryConfig::parse`] field-for-field.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(mh) = self.mat_height {
            out.push_str(&format!("MATHeight = {mh}\n"));
        }
        out.push_str(&format!("ROWS = {}\n", self.rows));
        out.push_str(&format!("COLS = {}\n", self.cols));
        out.push_str(&format!("BANKS = {}\n", self.banks));
        out.push_str(&format!("RANKS = {}\n", self.ranks));
        out.push_str(&format!("CHANNELS = {}\n", self.channels));
        out.push_str(&format!("AddressMappingScheme = {}\n", self.address_mapping_scheme));
        if let Some(d) = &self.decoder {
            out.push_str(&format!("Decoder = {d}\n"));
        }
        for (i, slot) in self.channel_config_paths.iter().enumerate() {
            if let Some(p) = slot {
                out.push_str(&format!("CONFIG_CHANNEL{i} = {p}\n"));
            }
        }
        out.push_str(&format!("MEM_CTL = {}\n", self.mem_ctl));
        out.push_str(&format!("MemoryPrefetcher = {}\n", self.memory_prefetcher));
        out.push_str(&format!("PrefetchBufferSize = {}\n", self.prefetch_buffer_size));
        if let Some(f) = &self.pre_trace_file {
            out.push_str(&format!("PreTraceFile = {f}\n"));
        }
        if let Some(w) = &self.pre_trace_writer {
            out.push_str(&format!("PreTraceWriter = {w}\n"));
        }
        out.push_str(&format!("PrintPreTrace = {}\n", self.print_pre_trace));
        out.push_str(&format!("EchoPreTrace = {}\n", self.echo_pre_trace));
        out
    }

    /// Number of subarrays per bank implied by `mat_height` and `rows`.
    pub fn subarrays(&self) -> u32 {
        match self.mat_height {
            Some(h) if h > 0 => (self.rows + h - 1) / h,
            _ => 1,
        }
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber { key: key.to_string(), value: value.to_string() })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidNumber { key: key.to_string(), value: value.to_string() }),
    }
}

fn resolve_relative(base_dir: &Path, value: &str) -> String {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        value.to_string()
    } else {
        let resolved: PathBuf = base_dir.join(candidate);
        resolved.to_string_lossy().into_owned()
    }
}
