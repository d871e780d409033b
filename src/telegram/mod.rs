// Telegram operator channel

pub mod client;
pub mod models;

pub use client::{truncate, TelegramClient};
pub use models::{
    ApiResponse, CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, Update,
};
