use std::process::Command;

/// The host launcher the dispatcher hands control back to.
pub trait Launcher: Send + Sync {
    /// Re-runs the launcher's search with `query` after its keyword.
    fn open_search(&self, query: &str);
    fn open_url(&self, url: &str);
}

#[derive(Debug, Clone)]
pub struct SystemLauncher {
    app: String,
    keyword: String,
}

impl SystemLauncher {
    pub fn new(app: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            keyword: keyword.into(),
        }
    }

    pub fn search_script(&self, query: &str) -> String {
        let search = format!("{} {}", self.keyword, query);
        format!(
            "tell application \"{}\" to search \"{}\"",
            escape_applescript(&self.app),
            escape_applescript(&search)
        )
    }
}

impl Launcher for SystemLauncher {
    fn open_search(&self, query: &str) {
        let script = self.search_script(query);
        tracing::debug!(%script, "reopening launcher search");

        match Command::new("osascript").arg("-e").arg(&script).status() {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::warn!(%status, "launcher search exited unsuccessfully"),
            Err(err) => tracing::warn!(error = %err, "failed to run osascript"),
        }
    }

    fn open_url(&self, url: &str) {
        if !open_in_browser(url) {
            tracing::warn!(url, "failed to open url");
        }
    }
}

pub fn open_in_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        return Command::new("open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "linux")]
    {
        return Command::new("xdg-open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "windows")]
    {
        return Command::new("cmd")
            .args(["/C", "start", "", url])
            .status()
            .is_ok_and(|status| status.success());
    }

    #[allow(unreachable_code)]
    false
}

fn escape_applescript(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_search_script() {
        let launcher = SystemLauncher::new("Alfred 2", "gmail");
        assert_eq!(
            launcher.search_script("in:inbox"),
            "tell application \"Alfred 2\" to search \"gmail in:inbox\""
        );
    }

    #[test]
    fn escapes_quotes_in_query() {
        let launcher = SystemLauncher::new("Alfred 2", "gmail");
        assert_eq!(
            launcher.search_script("subject:\"q3\""),
            "tell application \"Alfred 2\" to search \"gmail subject:\\\"q3\\\"\""
        );
    }
}
