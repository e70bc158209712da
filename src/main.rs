//! `wsframe` command line tool.
//!
//! Decodes frame headers from hex and builds headers for outgoing chunks.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use wsframe::{
    CodecError,
    FrameHeader,
    FramingError,
    MaskingKey,
    Opcode,
    UsageError,
    build_header,
    decode_header,
    length::required_header_len,
};

use crate::cli::{Cli, Command, OpcodeArg};

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid hex input: {0}")]
    InvalidHex(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl From<OpcodeArg> for Opcode {
    fn from(arg: OpcodeArg) -> Self {
        match arg {
            OpcodeArg::Text => Opcode::Text,
            OpcodeArg::Binary => Opcode::Binary,
            OpcodeArg::Close => Opcode::Close,
            OpcodeArg::Ping => Opcode::Ping,
            OpcodeArg::Pong => Opcode::Pong,
        }
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(digits).map_err(|_| CliError::InvalidHex(input.to_owned()))
}

fn describe(header: &FrameHeader) -> String {
    let flags = header.flags();
    let mut out = format!(
        "fin={} rsv=[{} {} {}] opcode={} header_len={} content_len={}",
        flags.fin,
        u8::from(flags.rsv1),
        u8::from(flags.rsv2),
        u8::from(flags.rsv3),
        flags.opcode,
        header.header_len(),
        header.content_len(),
    );
    if let Some(key) = header.masking_key() {
        out.push_str(" mask=");
        out.push_str(&hex::encode(key.as_bytes()));
    }
    out
}

fn decode(hex: &str) -> Result<String, CliError> {
    let bytes = parse_hex(hex)?;
    let header = decode_header(&bytes)?.ok_or_else(|| {
        CodecError::from(FramingError::IncompleteHeader {
            have: bytes.len(),
            need: required_header_len(&bytes),
        })
    })?;

    let mut out = describe(&header);
    let available = &bytes[header.header_len()..];
    let take = usize::try_from(header.content_len())
        .map_or(available.len(), |len| len.min(available.len()));
    if take > 0 {
        let mut payload = available[..take].to_vec();
        header.payload_cursor().unmask_in_place(&mut payload)?;
        out.push_str("\npayload=");
        out.push_str(&hex::encode(&payload));
        if header.opcode() == Opcode::Text {
            if let Ok(text) = std::str::from_utf8(&payload) {
                out.push_str(&format!(" text={text:?}"));
            }
        }
    }
    Ok(out)
}

fn encode(
    len: u64,
    opcode: OpcodeArg,
    fragment: bool,
    continued: bool,
    mask: Option<&str>,
) -> Result<String, CliError> {
    let mut header = build_header(len, !fragment, continued, opcode.into())?;
    if let Some(mask) = mask {
        let key: [u8; 4] = parse_hex(mask)?
            .try_into()
            .map_err(|_| CliError::InvalidHex(mask.to_owned()))?;
        header = header.with_masking_key(MaskingKey::new(key));
    }
    let raw = header.raw().map(hex::encode).unwrap_or_default();
    Ok(format!("{raw}\n{}", describe(&header)))
}

fn run(cli: Cli) -> Result<String, CliError> {
    match cli.command {
        Command::Decode { hex } => decode(&hex),
        Command::Encode {
            len,
            opcode,
            fragment,
            continued,
            mask,
        } => encode(len, opcode, fragment, continued, mask.as_deref()),
    }
}

fn main() -> ExitCode {
    // Structured logging for the binary; the library never installs a subscriber.
    tracing_subscriber::fmt::init();

    match run(Cli::parse()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "wsframe failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
