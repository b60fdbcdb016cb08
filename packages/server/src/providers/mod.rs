//! Clients for the external collaborators: video provider, identity provider,
//! transactional email and the text-enhancement LLM.

pub mod email;
pub mod identity;
pub mod llm;
pub mod video;
