//! External delivery channels.

pub mod whatsapp;
