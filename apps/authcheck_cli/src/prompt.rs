use authcheck_core::ports::CredentialPrompt;
use authcheck_core::Error;
use dialoguer::Input;

/// Reads credentials from the controlling terminal
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn email(&self) -> Result<Option<String>, Error> {
        let email: String = Input::new()
            .with_prompt("Enter your Monarch email (or press Enter to skip)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::Other(format!("failed to read email: {}", e)))?;

        let email = email.trim();
        Ok((!email.is_empty()).then(|| email.to_string()))
    }

    fn password(&self) -> Result<String, Error> {
        Ok(rpassword::prompt_password("Enter your Monarch password: ")?)
    }
}
