use thiserror::Error;

/// Operator commands read line by line from stdin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Clear volume, volume points, wear and wear rate.
    ClearData,
    SetTolerance(f64),
    RefreshStableToken,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("invalid value '{0}'")]
    InvalidValue(String),
}

/// Parse one input line; blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<ControlCommand>, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let cmd = match head.to_ascii_lowercase().as_str() {
        "clear" | "c" => ControlCommand::ClearData,
        "tol" | "threshold" | "t" => {
            let raw = parts.next().unwrap_or_default();
            let v: f64 = raw
                .parse()
                .map_err(|_| CommandError::InvalidValue(raw.to_string()))?;
            if !v.is_finite() || v < 0.0 {
                return Err(CommandError::InvalidValue(raw.to_string()));
            }
            ControlCommand::SetTolerance(v)
        }
        "refresh" | "r" => ControlCommand::RefreshStableToken,
        "quit" | "exit" | "q" => ControlCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(cmd))
}
