// Altrs Actions
// Every kind of action a profile can map, with its per-run state

use std::collections::HashMap;
use std::time::{Duration, Instant};

use strum_macros::IntoStaticStr;

use crate::event::{MenuOption, ReportPayload};
use crate::ids::ItemId;
use crate::key::{key_for_char, Key, MouseButton};

use super::context::{ActionContext, ActionError, StateRequest};

/// What an action does, with its configured parameters
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
pub enum ActionKind {
    TapKey { key: Key },
    /// Press on start, release on stop
    HoldKey { key: Key },
    ReleaseKey { key: Key },
    /// Press if not held by us, release otherwise
    ToggleKey { key: Key },
    /// Tap now and again every interval until stopped
    RepeatKey { key: Key, interval_ms: Option<u64> },
    TypeText { text: String },
    ClickMouse { button: MouseButton },
    HoldMouse { button: MouseButton },
    ReleaseMouse { button: MouseButton },
    DoubleClickMouse { button: MouseButton },
    /// Positive scrolls up
    Scroll { amount: i32 },
    RepeatScroll { amount: i32, interval_ms: Option<u64> },
    Wait { duration_ms: u64 },
    ChangeMode { mode_id: ItemId },
    ChangeApp { app_id: ItemId },
    ChangePage { page_id: ItemId },
    StartProgram { program: String, args: String },
    MenuOption { option: MenuOption },
}

impl ActionKind {
    /// Stable type name used in profile files
    pub fn type_name(&self) -> &'static str {
        self.into()
    }

    /// Parameters as name/value pairs for persistence
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let interval = |ms: &Option<u64>| ms.map(|ms| ("interval", ms.to_string()));
        match self {
            ActionKind::TapKey { key }
            | ActionKind::HoldKey { key }
            | ActionKind::ReleaseKey { key }
            | ActionKind::ToggleKey { key } => vec![("key", key.name().to_string())],
            ActionKind::RepeatKey { key, interval_ms } => {
                let mut params = vec![("key", key.name().to_string())];
                params.extend(interval(interval_ms));
                params
            }
            ActionKind::TypeText { text } => vec![("text", text.clone())],
            ActionKind::ClickMouse { button }
            | ActionKind::HoldMouse { button }
            | ActionKind::ReleaseMouse { button }
            | ActionKind::DoubleClickMouse { button } => vec![("button", button.to_string())],
            ActionKind::Scroll { amount } => vec![("amount", amount.to_string())],
            ActionKind::RepeatScroll {
                amount,
                interval_ms,
            } => {
                let mut params = vec![("amount", amount.to_string())];
                params.extend(interval(interval_ms));
                params
            }
            ActionKind::Wait { duration_ms } => vec![("duration", duration_ms.to_string())],
            ActionKind::ChangeMode { mode_id } => vec![("mode", mode_id.to_string())],
            ActionKind::ChangeApp { app_id } => vec![("app", app_id.to_string())],
            ActionKind::ChangePage { page_id } => vec![("page", page_id.to_string())],
            ActionKind::StartProgram { program, args } => {
                vec![("program", program.clone()), ("args", args.clone())]
            }
            ActionKind::MenuOption { option } => vec![("option", option.to_string())],
        }
    }

    /// Rebuild an action from its type name and parameters
    pub fn from_params(
        type_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<Self, ActionError> {
        let get = |name: &str| {
            params
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| invalid(format!("{} needs '{}'", type_name, name)))
        };
        let key = || -> Result<Key, ActionError> {
            get("key")?.parse().map_err(|e: String| invalid(e))
        };
        let button = || -> Result<MouseButton, ActionError> {
            let raw = get("button")?;
            raw.parse()
                .map_err(|_| invalid(format!("unknown mouse button '{}'", raw)))
        };
        let number = |name: &str| -> Result<i64, ActionError> {
            let raw = get(name)?;
            raw.trim()
                .parse()
                .map_err(|_| invalid(format!("'{}' is not a number for '{}'", raw, name)))
        };
        let amount = || -> Result<i32, ActionError> {
            let value = number("amount")?;
            i32::try_from(value)
                .map_err(|_| invalid(format!("scroll amount {} is out of range", value)))
        };
        let interval = || -> Result<Option<u64>, ActionError> {
            match params.get("interval") {
                Some(_) => Ok(Some(number("interval")?.max(1) as u64)),
                None => Ok(None),
            }
        };

        let kind = match type_name {
            "TapKey" => ActionKind::TapKey { key: key()? },
            "HoldKey" => ActionKind::HoldKey { key: key()? },
            "ReleaseKey" => ActionKind::ReleaseKey { key: key()? },
            "ToggleKey" => ActionKind::ToggleKey { key: key()? },
            "RepeatKey" => ActionKind::RepeatKey {
                key: key()?,
                interval_ms: interval()?,
            },
            "TypeText" => ActionKind::TypeText {
                text: get("text")?.to_string(),
            },
            "ClickMouse" => ActionKind::ClickMouse { button: button()? },
            "HoldMouse" => ActionKind::HoldMouse { button: button()? },
            "ReleaseMouse" => ActionKind::ReleaseMouse { button: button()? },
            "DoubleClickMouse" => ActionKind::DoubleClickMouse { button: button()? },
            "Scroll" => ActionKind::Scroll { amount: amount()? },
            "RepeatScroll" => ActionKind::RepeatScroll {
                amount: amount()?,
                interval_ms: interval()?,
            },
            "Wait" => ActionKind::Wait {
                duration_ms: number("duration")?.max(0) as u64,
            },
            "ChangeMode" => ActionKind::ChangeMode {
                mode_id: number("mode")?,
            },
            "ChangeApp" => ActionKind::ChangeApp {
                app_id: number("app")?,
            },
            "ChangePage" => ActionKind::ChangePage {
                page_id: number("page")?,
            },
            "StartProgram" => ActionKind::StartProgram {
                program: get("program")?.to_string(),
                args: params.get("args").cloned().unwrap_or_default(),
            },
            "MenuOption" => {
                let raw = get("option")?;
                ActionKind::MenuOption {
                    option: raw
                        .parse()
                        .map_err(|_| invalid(format!("unknown menu option '{}'", raw)))?,
                }
            }
            other => return Err(invalid(format!("unknown action type '{}'", other))),
        };
        Ok(kind)
    }
}

fn invalid(reason: impl Into<String>) -> ActionError {
    ActionError::InvalidParameter(reason.into())
}

/// Progress of a running action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    /// Held until stopped
    Holding,
    /// Repeats when `next` is reached
    Repeating { next: Instant, interval: Duration },
    /// Completes when `until` is reached
    Waiting { until: Instant },
}

/// A configured action plus its runtime state
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    kind: ActionKind,
    phase: Phase,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            phase: Phase::Idle,
        }
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// True while the action's effect outlives the tick it started in
    pub fn is_ongoing(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Begin the action.
    ///
    /// On error the action is left idle, so a failing action counts as done.
    pub fn start(&mut self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        self.phase = Phase::Idle;
        match &self.kind {
            ActionKind::TapKey { key } => ctx.tap_key(*key)?,
            ActionKind::HoldKey { key } => {
                ctx.key(*key, true)?;
                self.phase = Phase::Holding;
            }
            ActionKind::ReleaseKey { key } => ctx.key(*key, false)?,
            ActionKind::ToggleKey { key } => {
                let on = !ctx.is_key_held(*key);
                ctx.key(*key, on)?;
                ctx.report(ReportPayload::ToggleKeyEvent { key: *key, on });
            }
            ActionKind::RepeatKey { key, interval_ms } => {
                ctx.tap_key(*key)?;
                self.phase = repeating(ctx, *interval_ms);
            }
            ActionKind::TypeText { text } => type_text(ctx, text)?,
            ActionKind::ClickMouse { button } => ctx.click(*button)?,
            ActionKind::HoldMouse { button } => {
                ctx.mouse_button(*button, true)?;
                self.phase = Phase::Holding;
            }
            ActionKind::ReleaseMouse { button } => ctx.mouse_button(*button, false)?,
            ActionKind::DoubleClickMouse { button } => {
                ctx.click(*button)?;
                ctx.click(*button)?;
            }
            ActionKind::Scroll { amount } => ctx.scroll(*amount)?,
            ActionKind::RepeatScroll {
                amount,
                interval_ms,
            } => {
                ctx.scroll(*amount)?;
                self.phase = repeating(ctx, *interval_ms);
            }
            ActionKind::Wait { duration_ms } => {
                if *duration_ms > 0 {
                    self.phase = Phase::Waiting {
                        until: ctx.now + Duration::from_millis(*duration_ms),
                    };
                }
            }
            ActionKind::ChangeMode { mode_id } => ctx.request(StateRequest::Mode(*mode_id)),
            ActionKind::ChangeApp { app_id } => ctx.request(StateRequest::App(*app_id)),
            ActionKind::ChangePage { page_id } => ctx.request(StateRequest::Page(*page_id)),
            ActionKind::StartProgram { program, args } => {
                ctx.start_program(program, args)?;
            }
            ActionKind::MenuOption { option } => ctx.menu(*option),
        }
        Ok(())
    }

    /// Advance by one tick
    pub fn continue_(&mut self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        match self.phase {
            Phase::Idle | Phase::Holding => {}
            Phase::Repeating { next, interval } => {
                if ctx.now >= next {
                    // Reset first so a failed repeat ends the action
                    self.phase = Phase::Idle;
                    match &self.kind {
                        ActionKind::RepeatKey { key, .. } => ctx.tap_key(*key)?,
                        ActionKind::RepeatScroll { amount, .. } => ctx.scroll(*amount)?,
                        _ => {}
                    }
                    self.phase = Phase::Repeating {
                        next: next + interval,
                        interval,
                    };
                }
            }
            Phase::Waiting { until } => {
                if ctx.now >= until {
                    self.phase = Phase::Idle;
                }
            }
        }
        Ok(())
    }

    /// End the action, releasing anything it holds. Safe on an idle action.
    pub fn stop(&mut self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
        let phase = std::mem::take(&mut self.phase);
        if phase == Phase::Holding {
            match &self.kind {
                ActionKind::HoldKey { key } => ctx.key(*key, false)?,
                ActionKind::HoldMouse { button } => ctx.mouse_button(*button, false)?,
                _ => {}
            }
        }
        Ok(())
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Action::new(kind)
    }
}

fn repeating(ctx: &ActionContext<'_>, interval_ms: Option<u64>) -> Phase {
    let interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| ctx.config.repeat_interval());
    Phase::Repeating {
        next: ctx.now + interval,
        interval,
    }
}

fn type_text(ctx: &mut ActionContext<'_>, text: &str) -> Result<(), ActionError> {
    let shift = Key::from(42);
    for ch in text.chars() {
        let Some((key, shifted)) = key_for_char(ch) else {
            log::warn!("Cannot type character {:?}", ch);
            continue;
        };
        if shifted {
            ctx.key(shift, true)?;
        }
        let typed = ctx.tap_key(key);
        if shifted {
            ctx.key(shift, false)?;
        }
        typed?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::context::ActionOutput;
    use crate::config::AppConfig;
    use crate::output::{OutputEvent, RecordingSimulator};

    fn setup() -> (RecordingSimulator, ActionOutput, AppConfig) {
        let recorder = RecordingSimulator::new();
        let output = ActionOutput::new(Box::new(recorder.clone()));
        (recorder, output, AppConfig::new())
    }

    fn key_event(code: u16, pressed: bool) -> OutputEvent {
        OutputEvent::Key {
            key: Key::from(code),
            pressed,
        }
    }

    #[test]
    fn test_tap_key_is_instant() {
        let (recorder, mut output, config) = setup();
        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        let mut action = Action::new(ActionKind::TapKey { key: Key::from(30) });

        action.start(&mut ctx).unwrap();
        assert!(!action.is_ongoing());
        assert_eq!(recorder.events(), vec![key_event(30, true), key_event(30, false)]);
    }

    #[test]
    fn test_hold_key_until_stopped() {
        let (recorder, mut output, config) = setup();
        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        let mut action = Action::new(ActionKind::HoldKey { key: Key::from(42) });

        action.start(&mut ctx).unwrap();
        assert!(action.is_ongoing());
        action.continue_(&mut ctx).unwrap();
        assert!(action.is_ongoing());
        action.stop(&mut ctx).unwrap();
        assert!(!action.is_ongoing());
        action.stop(&mut ctx).unwrap();

        assert_eq!(recorder.events(), vec![key_event(42, true), key_event(42, false)]);
    }

    #[test]
    fn test_repeat_key_follows_interval() {
        let (recorder, mut output, config) = setup();
        let t0 = Instant::now();
        let mut action = Action::new(ActionKind::RepeatKey {
            key: Key::from(30),
            interval_ms: Some(50),
        });

        action
            .start(&mut ActionContext::new(t0, &config, &mut output))
            .unwrap();
        for ms in [20, 49, 50, 80, 100] {
            let mut ctx = ActionContext::new(t0 + Duration::from_millis(ms), &config, &mut output);
            action.continue_(&mut ctx).unwrap();
        }
        assert!(action.is_ongoing());
        // Initial tap plus repeats at 50 and 100
        assert_eq!(recorder.events().len(), 6);
    }

    #[test]
    fn test_wait_completes_at_deadline() {
        let (_, mut output, config) = setup();
        let t0 = Instant::now();
        let mut action = Action::new(ActionKind::Wait { duration_ms: 100 });

        action
            .start(&mut ActionContext::new(t0, &config, &mut output))
            .unwrap();
        action
            .continue_(&mut ActionContext::new(
                t0 + Duration::from_millis(99),
                &config,
                &mut output,
            ))
            .unwrap();
        assert!(action.is_ongoing());
        action
            .continue_(&mut ActionContext::new(
                t0 + Duration::from_millis(100),
                &config,
                &mut output,
            ))
            .unwrap();
        assert!(!action.is_ongoing());
    }

    #[test]
    fn test_toggle_key_flips() {
        let (recorder, mut output, config) = setup();
        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        let mut action = Action::new(ActionKind::ToggleKey { key: Key::from(29) });

        action.start(&mut ctx).unwrap();
        assert!(ctx.is_key_held(Key::from(29)));
        action.start(&mut ctx).unwrap();
        assert!(!ctx.is_key_held(Key::from(29)));
        assert_eq!(recorder.events(), vec![key_event(29, true), key_event(29, false)]);

        let toggles: Vec<_> = output
            .take_reports()
            .into_iter()
            .filter_map(|r| match r.payload {
                ReportPayload::ToggleKeyEvent { on, .. } => Some(on),
                _ => None,
            })
            .collect();
        assert_eq!(toggles, vec![true, false]);
    }

    #[test]
    fn test_type_text_uses_shift() {
        let (recorder, mut output, config) = setup();
        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        let mut action = Action::new(ActionKind::TypeText {
            text: "aB".to_string(),
        });

        action.start(&mut ctx).unwrap();
        assert_eq!(
            recorder.events(),
            vec![
                key_event(30, true),
                key_event(30, false),
                key_event(42, true),
                key_event(48, true),
                key_event(48, false),
                key_event(42, false),
            ]
        );
    }

    #[test]
    fn test_change_mode_is_requested() {
        let (_, mut output, config) = setup();
        let mut ctx = ActionContext::new(Instant::now(), &config, &mut output);
        Action::new(ActionKind::ChangeMode { mode_id: 3 })
            .start(&mut ctx)
            .unwrap();
        assert_eq!(output.take_requests(), vec![StateRequest::Mode(3)]);
    }

    #[test]
    fn test_params_round_trip_by_kind() {
        let kinds = vec![
            ActionKind::HoldKey { key: Key::from(42) },
            ActionKind::RepeatKey {
                key: Key::from(30),
                interval_ms: Some(250),
            },
            ActionKind::DoubleClickMouse {
                button: MouseButton::Right,
            },
            ActionKind::RepeatScroll {
                amount: -2,
                interval_ms: None,
            },
            ActionKind::StartProgram {
                program: "xterm".to_string(),
                args: "-e top".to_string(),
            },
            ActionKind::MenuOption {
                option: MenuOption::Next,
            },
        ];
        for kind in kinds {
            let params: HashMap<String, String> = kind
                .params()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
            assert_eq!(
                ActionKind::from_params(kind.type_name(), &params).unwrap(),
                kind
            );
        }
    }

    #[test]
    fn test_from_params_errors() {
        let empty = HashMap::new();
        assert!(matches!(
            ActionKind::from_params("HoldKey", &empty),
            Err(ActionError::InvalidParameter(_))
        ));
        assert!(ActionKind::from_params("Teleport", &empty).is_err());

        let mut params = HashMap::new();
        params.insert("key".to_string(), "NOT_A_KEY".to_string());
        assert!(ActionKind::from_params("TapKey", &params).is_err());
    }

    #[test]
    fn test_scroll_amount_out_of_range() {
        let mut params = HashMap::new();
        params.insert("amount".to_string(), "4294967297".to_string());
        assert!(matches!(
            ActionKind::from_params("Scroll", &params),
            Err(ActionError::InvalidParameter(_))
        ));
        assert!(matches!(
            ActionKind::from_params("RepeatScroll", &params),
            Err(ActionError::InvalidParameter(_))
        ));

        params.insert("amount".to_string(), "-3".to_string());
        assert_eq!(
            ActionKind::from_params("Scroll", &params).unwrap(),
            ActionKind::Scroll { amount: -3 }
        );
    }
}
