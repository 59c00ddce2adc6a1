use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use super::{ActionKind, ActionParams, Automation};

/// A process invocation that carries out one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandPlan {
    fn osascript(script: String) -> Self {
        Self {
            program: "osascript".to_string(),
            args: vec!["-e".to_string(), script],
        }
    }

    fn open(args: &[&str]) -> Self {
        Self {
            program: "open".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Quotes a value for embedding in an AppleScript string literal.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn param<'a>(params: &'a ActionParams, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing parameter '{}'", key))
}

/// Pure function: (ActionKind, params) -> process invocation.
pub fn plan_command(kind: ActionKind, params: &ActionParams) -> Result<CommandPlan> {
    let plan = match kind {
        ActionKind::SendEmail => CommandPlan::osascript(format!(
            "tell application \"Mail\"\n\
             set newMessage to make new outgoing message with properties \
             {{subject:{}, content:{}, visible:false}}\n\
             tell newMessage to make new to recipient at end of to recipients \
             with properties {{address:{}}}\n\
             send newMessage\n\
             end tell",
            quoted(param(params, "subject")?),
            quoted(param(params, "body")?),
            quoted(param(params, "to")?),
        )),
        ActionKind::CreateReminder => CommandPlan::osascript(format!(
            "tell application \"Reminders\" to make new reminder \
             with properties {{name:{}, remind me date:date {}}}",
            quoted(param(params, "title")?),
            quoted(param(params, "due")?),
        )),
        ActionKind::CreateCalendarEvent => {
            let minutes: u32 = params
                .get("duration_minutes")
                .and_then(|m| m.parse().ok())
                .unwrap_or(60);
            CommandPlan::osascript(format!(
                "tell application \"Calendar\"\n\
                 tell first calendar\n\
                 set startDate to date {}\n\
                 make new event with properties {{summary:{}, start date:startDate, \
                 end date:startDate + {} * minutes}}\n\
                 end tell\n\
                 end tell",
                quoted(param(params, "starts_at")?),
                quoted(param(params, "title")?),
                minutes,
            ))
        }
        ActionKind::SendMessage => CommandPlan::osascript(format!(
            "tell application \"Messages\" to send {} to participant {} \
             of (1st account whose service type = iMessage)",
            quoted(param(params, "body")?),
            quoted(param(params, "phone")?),
        )),
        ActionKind::PlaceCall => {
            let phone = param(params, "phone")?;
            let scheme = match params.get("facetime").map(String::as_str) {
                Some("true") => "facetime",
                _ => "tel",
            };
            CommandPlan::open(&[&format!("{}://{}", scheme, phone)])
        }
        ActionKind::Shutdown => {
            CommandPlan::osascript("tell application \"System Events\" to shut down".to_string())
        }
        ActionKind::OpenApp => CommandPlan::open(&["-a", param(params, "name")?]),
        ActionKind::OpenUrl => CommandPlan::open(&["-a", "Safari", param(params, "url")?]),
        ActionKind::SetVolume => {
            let percent: u8 = param(params, "percent")?
                .parse()
                .map_err(|e| anyhow!("invalid volume: {}", e))?;
            CommandPlan::osascript(format!("set volume output volume {}", percent.min(100)))
        }
    };
    Ok(plan)
}

/// Runs planned commands on macOS. The child is not awaited by the caller;
/// its exit status is only logged.
#[derive(Debug, Default)]
pub struct AppleScriptAutomation;

#[async_trait]
impl Automation for AppleScriptAutomation {
    async fn automate(&self, kind: ActionKind, params: &ActionParams) -> Result<()> {
        let plan = plan_command(kind, params)?;
        let mut child = tokio::process::Command::new(&plan.program)
            .args(&plan.args)
            .spawn()?;

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!("{:?} completed", kind),
                Ok(status) => warn!("{:?} exited with {}", kind, status),
                Err(e) => warn!("{:?} could not be awaited: {}", kind, e),
            }
        });
        Ok(())
    }
}

/// Logs what would run. Used where the host has no AppleScript.
#[derive(Debug, Default)]
pub struct DryRunAutomation;

#[async_trait]
impl Automation for DryRunAutomation {
    async fn automate(&self, kind: ActionKind, params: &ActionParams) -> Result<()> {
        let plan = plan_command(kind, params)?;
        info!("[DRY-RUN] {} {:?}", plan.program, plan.args);
        Ok(())
    }
}
