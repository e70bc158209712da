//! Command line interface for the `wsframe` binary.
//!
//! Decodes frame headers given as hex and builds headers for outgoing
//! chunks, which is handy when reading packet captures.

use clap::{Parser, Subcommand, ValueEnum};

/// Command line arguments for the `wsframe` binary.
#[derive(Debug, Parser)]
#[command(name = "wsframe", version, about = "Inspect and build WebSocket frame headers")]
pub struct Cli {
    /// Operation to perform.
    #[command(subcommand)]
    pub command: Command,
}

/// `wsframe` subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a frame from hex bytes and print its header.
    Decode {
        /// Frame bytes as hex; whitespace and `:` separators are ignored.
        hex: String,
    },
    /// Build the header for an outgoing chunk and print it as hex.
    Encode {
        /// Payload length in bytes.
        #[arg(short, long)]
        len: u64,
        /// Message opcode.
        #[arg(short, long, value_enum, default_value_t = OpcodeArg::Binary)]
        opcode: OpcodeArg,
        /// Mark the chunk as not final.
        #[arg(long)]
        fragment: bool,
        /// The message header was already sent in an earlier chunk.
        #[arg(long)]
        continued: bool,
        /// Masking key as 8 hex digits.
        #[arg(short, long)]
        mask: Option<String>,
    },
}

/// Opcodes accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OpcodeArg {
    /// UTF-8 text.
    Text,
    /// Binary data.
    Binary,
    /// Connection close.
    Close,
    /// Ping.
    Ping,
    /// Pong.
    Pong,
}
