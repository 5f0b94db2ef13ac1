//! 逐字输入节奏

use std::time::Duration;

use phf::phf_map;
use rand::Rng;

use super::simulator::{millis, InteractionSimulator};

/// 会让人放慢的标点
const PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// QWERTY 键盘上的相邻键，用来制造"手滑"
static QWERTY_NEIGHBORS: phf::Map<char, &'static str> = phf_map! {
    'q' => "wa", 'w' => "qeas", 'e' => "wrsd", 'r' => "etdf", 't' => "ryfg",
    'y' => "tugh", 'u' => "yihj", 'i' => "uojk", 'o' => "ipkl", 'p' => "ol",
    'a' => "qwsz", 's' => "awedxz", 'd' => "serfcx", 'f' => "drtgvc", 'g' => "ftyhbv",
    'h' => "gyujnb", 'j' => "huikmn", 'k' => "jiolm", 'l' => "kop",
    'z' => "asx", 'x' => "zsdc", 'c' => "xdfv", 'v' => "cfgb", 'b' => "vghn",
    'n' => "bhjm", 'm' => "njk",
};

/// 单次按键动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Char(char),
    Backspace,
}

/// 按键事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub action: KeyAction,
    /// 是否为原文中的字符（错字和退格为 false）
    pub real: bool,
    /// 按键后的停顿
    pub delay_after: Duration,
}

impl InteractionSimulator {
    /// 生成逐字输入计划
    ///
    /// 原文每个字符恰好对应一个 `real` 事件；错字绕路（错键 → 退格）只插在字母前。
    pub fn keystroke_stream(&mut self, text: &str) -> Vec<Keystroke> {
        let b = &self.bounds;
        let rng = &mut self.rng;
        let chars: Vec<char> = text.chars().collect();
        let mut stream = Vec::with_capacity(chars.len());

        for (i, &ch) in chars.iter().enumerate() {
            let mut delay_ms = rng.random_range(b.key_delay_ms.clone());
            if PUNCTUATION.contains(&ch) {
                delay_ms += rng.random_range(b.punctuation_delay_ms.clone());
            }
            if i > 0 && chars[i - 1] == ' ' {
                delay_ms += rng.random_range(b.word_delay_ms.clone());
            }
            if rng.random_bool(b.think_chance) {
                delay_ms += rng.random_range(b.think_ms.clone());
            }

            if ch.is_alphabetic() && rng.random_bool(b.typo_chance) {
                if let Some(wrong) = adjacent_key(rng, ch) {
                    stream.push(Keystroke {
                        action: KeyAction::Char(wrong),
                        real: false,
                        delay_after: millis(rng.random_range(b.typo_hold_ms.clone())),
                    });
                    stream.push(Keystroke {
                        action: KeyAction::Backspace,
                        real: false,
                        delay_after: millis(rng.random_range(b.typo_fix_ms.clone())),
                    });
                }
            }

            stream.push(Keystroke {
                action: KeyAction::Char(ch),
                real: true,
                delay_after: millis(delay_ms),
            });
        }

        stream
    }
}

/// 相邻键，保持大小写；键盘上没有的字符返回 None
fn adjacent_key<R: Rng>(rng: &mut R, ch: char) -> Option<char> {
    let lower = ch.to_ascii_lowercase();
    let neighbors = QWERTY_NEIGHBORS.get(&lower)?;
    let idx = rng.random_range(0..neighbors.len());
    let wrong = neighbors.as_bytes()[idx] as char;
    Some(if ch.is_ascii_uppercase() {
        wrong.to_ascii_uppercase()
    } else {
        wrong
    })
}

/// 按计划回放后得到的文本（错字会被退格抵消）
pub fn replay(stream: &[Keystroke]) -> String {
    let mut out = String::new();
    for key in stream {
        match key.action {
            KeyAction::Char(c) => out.push(c),
            KeyAction::Backspace => {
                out.pop();
            }
        }
    }
    out
}
