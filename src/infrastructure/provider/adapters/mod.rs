//! Vendor adapters
//!
//! Each adapter owns its vendor's URLs, wire format and defaults. Shared
//! HTTP plumbing lives in `base`; the two wire formats used by more than
//! one vendor live in `chat_wire` and `gemini_wire`.

pub mod base;
mod chat_wire;
mod gemini_wire;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "azure")]
pub mod azure;
#[cfg(feature = "bedrock")]
pub mod bedrock;
#[cfg(feature = "cohere")]
pub mod cohere;
#[cfg(feature = "google")]
pub mod gemini;
#[cfg(feature = "huggingface")]
pub mod huggingface;
#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai-compatible")]
pub mod openai;
#[cfg(feature = "vertex")]
pub mod vertex;
#[cfg(feature = "watsonx")]
pub mod watsonx;
