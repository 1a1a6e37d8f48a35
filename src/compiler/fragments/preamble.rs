use super::{Fragment, FragmentGenerator, FragmentKind, GenerationContext};
use crate::compiler::emit::SourceWriter;

pub struct PreambleGenerator;

impl FragmentGenerator for PreambleGenerator {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Preamble
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> Fragment {
        let mut w = SourceWriter::new();
        w.line("#!/usr/bin/env python3");
        w.line(format!("# {}", header_name(ctx.display_name)));
        w.line("# Generated by botflow. Edit the flow in the editor and recompile");
        w.line("# instead of changing this file by hand.");
        w.blank();
        w.snippet(IMPORTS);
        if ctx.flags.needs_persistence {
            w.line("import asyncpg");
        }
        w.blank();
        w.line("load_dotenv()");

        Fragment::new(self.kind(), w.finish()).providing(["load_dotenv", "types", "F"])
    }
}

/// Keeps the display name on a single comment line.
fn header_name(name: &str) -> String {
    let flat: String = name
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();
    if flat.is_empty() {
        "Telegram bot".to_string()
    } else {
        flat.to_string()
    }
}

const IMPORTS: &str = r#"import asyncio
import json
import logging
import os
from dataclasses import dataclass
from typing import Optional

from aiogram import Bot, Dispatcher, F, types
from aiogram.enums import ParseMode
from aiogram.filters import Command
from aiogram.types import (
    BotCommand,
    InlineKeyboardButton,
    InlineKeyboardMarkup,
    KeyboardButton,
    ReplyKeyboardMarkup,
    ReplyKeyboardRemove,
)
from aiogram.utils.keyboard import InlineKeyboardBuilder, ReplyKeyboardBuilder
from dotenv import load_dotenv"#;
