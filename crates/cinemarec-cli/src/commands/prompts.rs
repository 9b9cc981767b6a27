use color_eyre::Result;
use dialoguer::{Confirm, Input, MultiSelect, Select};

/// Prompt for a string value with optional default
pub fn prompt_string(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input_builder = Input::<String>::new().with_prompt(prompt).allow_empty(true);

    if let Some(default_value) = default {
        input_builder = input_builder.default(default_value.to_string());
    }

    input_builder
        .interact_text()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read input: {}", e))
}

/// Prompt for a non-empty string, re-asking until one is given
pub fn prompt_required(prompt: &str, default: Option<&str>) -> Result<String> {
    loop {
        let value = prompt_string(prompt, default)?;
        if !value.trim().is_empty() {
            return Ok(value.trim().to_string());
        }
        eprintln!("A value is required.");
    }
}

/// Prompt for a password (masked input)
pub fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", prompt))
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read password: {}", e))
}

/// Prompt for yes/no with optional default
pub fn prompt_yes_no(prompt: &str, default: Option<bool>) -> Result<bool> {
    let mut confirm_builder = Confirm::new().with_prompt(prompt);

    if let Some(default_value) = default {
        confirm_builder = confirm_builder.default(default_value);
    }

    confirm_builder
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}

/// Prompt for a number in `min..=max` with optional default
pub fn prompt_number(prompt: &str, default: Option<u32>, min: u32, max: u32) -> Result<u32> {
    loop {
        let default_text = default.map(|d| d.to_string());
        let input_str = prompt_string(prompt, default_text.as_deref())?;
        let trimmed = input_str.trim();

        match trimmed.parse::<u32>() {
            Ok(num) if (min..=max).contains(&num) => return Ok(num),
            _ => eprintln!("Please enter a number between {} and {}.", min, max),
        }
    }
}

/// Prompt for a decimal number
pub fn prompt_decimal(prompt: &str, default: f64) -> Result<f64> {
    loop {
        let input_str = prompt_string(prompt, Some(&default.to_string()))?;
        match input_str.trim().parse::<f64>() {
            Ok(value) => return Ok(value),
            Err(_) => eprintln!("Please enter a number."),
        }
    }
}

/// Pick one item; returns its index
pub fn prompt_select<T: ToString>(prompt: &str, items: &[T], default: usize) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(default.min(items.len().saturating_sub(1)))
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))
}

/// Check any number of items; returns the checked indexes
pub fn prompt_multi_select<T: ToString>(prompt: &str, items: &[T], checked: &[bool]) -> Result<Vec<usize>> {
    MultiSelect::new()
        .with_prompt(prompt)
        .items(items)
        .defaults(checked)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))
}
