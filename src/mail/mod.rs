pub mod decoders;
pub mod encoder;
pub mod gmail_client;
pub mod html;
pub mod provider;
