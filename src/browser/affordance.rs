//! 远程页面上的可交互元素
//!
//! 页面使用图标字体和多语言文案，CSS 选择器无法直接表达"包含某个图标的按钮"，
//! 因此每个元素都用一段返回 DOM 节点（或 null）的 JS 表达式来定位。

use std::fmt;

/// 远程页面约定的元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    /// "New project" 按钮，出现即说明已登录
    NewProject,
    /// 落地页 "Create with Flow" 按钮
    BeginCreation,
    /// 账号输入框
    IdentityField,
    /// 密码输入框
    SecretField,
    /// 提示词输入框
    PromptInput,
    /// 设置按钮（tune 图标）
    SettingsButton,
    /// "Outputs per prompt" 下拉框
    OutputsCombobox,
    /// 下拉框中的数量选项
    OutputsOption(u8),
    /// 错误提示 toast
    ErrorToast,
    /// 错误提示上的关闭按钮
    ErrorToastDismiss,
}

impl Affordance {
    /// 返回定位该元素的 JS 表达式
    pub fn locator_js(&self) -> String {
        match self {
            Affordance::NewProject => button_with_icon("add_2"),
            Affordance::BeginCreation => r#"[...document.querySelectorAll('button')].find(b =>
                [...b.querySelectorAll('span')].some(s =>
                    ['Create with Flow', 'Tạo bằng Flow'].includes(s.textContent.trim())))"#
                .to_string(),
            Affordance::IdentityField => r#"document.querySelector('input[type="email"]')"#.to_string(),
            Affordance::SecretField => {
                r#"document.querySelector('input[type="password"]')"#.to_string()
            }
            Affordance::PromptInput => {
                "document.getElementById('PINHOLE_TEXT_AREA_ELEMENT_ID')".to_string()
            }
            Affordance::SettingsButton => button_with_icon("tune"),
            Affordance::OutputsCombobox => r#"[...document.querySelectorAll('button[role="combobox"]')].find(b =>
                [...b.querySelectorAll('span')].some(s => s.textContent.includes('Outputs per prompt')))"#
                .to_string(),
            Affordance::OutputsOption(n) => format!(
                r#"[...document.querySelectorAll('[role="option"]')].find(o => o.textContent.includes('{n}'))"#
            ),
            Affordance::ErrorToast => error_toast_js(),
            Affordance::ErrorToastDismiss => format!(
                "(() => {{ const t = {}; return t ? t.querySelector('button') : null; }})()",
                error_toast_js()
            ),
        }
    }

    /// 元素存在且可见时返回 true
    pub fn visibility_js(&self) -> String {
        format!(
            r#"(() => {{
                const el = {};
                if (!el) return false;
                const r = el.getBoundingClientRect();
                const s = window.getComputedStyle(el);
                return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
            }})()"#,
            self.locator_js()
        )
    }

    /// 返回元素包围盒 `{x, y, width, height}`，找不到时返回 null
    pub fn bounding_box_js(&self) -> String {
        format!(
            r#"(() => {{
                const el = {};
                if (!el) return null;
                const r = el.getBoundingClientRect();
                if (r.width === 0 && r.height === 0) return null;
                return {{ x: r.x, y: r.y, width: r.width, height: r.height }};
            }})()"#,
            self.locator_js()
        )
    }

    /// 直接触发元素的 click（拿不到包围盒时的兜底）
    pub fn click_js(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            self.locator_js()
        )
    }

    /// 元素的可见文本
    pub fn text_js(&self) -> String {
        format!(
            "(() => {{ const el = {}; return el ? el.innerText : null; }})()",
            self.locator_js()
        )
    }
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affordance::NewProject => write!(f, "'New project' 按钮"),
            Affordance::BeginCreation => write!(f, "'Create with Flow' 按钮"),
            Affordance::IdentityField => write!(f, "账号输入框"),
            Affordance::SecretField => write!(f, "密码输入框"),
            Affordance::PromptInput => write!(f, "提示词输入框"),
            Affordance::SettingsButton => write!(f, "设置按钮"),
            Affordance::OutputsCombobox => write!(f, "'Outputs per prompt' 下拉框"),
            Affordance::OutputsOption(n) => write!(f, "输出数量选项 {}", n),
            Affordance::ErrorToast => write!(f, "错误提示"),
            Affordance::ErrorToastDismiss => write!(f, "错误提示关闭按钮"),
        }
    }
}

fn button_with_icon(icon: &str) -> String {
    format!(
        r#"[...document.querySelectorAll('button')].find(b =>
            [...b.querySelectorAll('i')].some(i => i.textContent.trim() === '{icon}'))"#
    )
}

fn error_toast_js() -> String {
    r#"[...document.querySelectorAll('[data-sonner-toast][data-visible="true"]')].find(t =>
        [...t.querySelectorAll('i')].some(i => i.textContent.trim() === 'error'))"#
        .to_string()
}
