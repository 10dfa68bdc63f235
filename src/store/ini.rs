// Minimal INI handling for the AWS credentials/config files. Only the
// operations the store needs: parse, full-section replace, delete.

/// Parse INI content into ordered (section, key/value) pairs.
/// Comment lines and keys outside any section are ignored.
pub fn parse(content: &str) -> Vec<(String, Vec<(String, String)>)> {
    let mut sections: Vec<(String, Vec<(String, String)>)> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = trimmed[1..trimmed.len() - 1].trim().to_string();
            sections.push((name, Vec::new()));
        } else if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        } else if let Some((_, entries)) = sections.last_mut() {
            if let Some(eq_pos) = trimmed.find('=') {
                let key = trimmed[..eq_pos].trim().to_string();
                let value = trimmed[eq_pos + 1..].trim().to_string();
                entries.push((key, value));
            }
        }
    }

    sections
}

/// Find a section by exact name.
pub fn section<'a>(
    sections: &'a [(String, Vec<(String, String)>)],
    name: &str,
) -> Option<&'a Vec<(String, String)>> {
    sections
        .iter()
        .find(|(section_name, _)| section_name == name)
        .map(|(_, entries)| entries)
}

/// Replace a section wholesale: any existing section of that name is
/// removed and a fresh one appended with exactly the given entries.
pub fn replace_section(content: &str, section_name: &str, entries: &[(&str, String)]) -> String {
    let without = delete_section(content, section_name);
    let mut result = without;

    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    if !result.is_empty() {
        result.push('\n');
    }

    result.push_str(&format!("[{}]\n", section_name));
    for (key, value) in entries {
        result.push_str(&format!("{} = {}\n", key, value));
    }

    cleanup_empty_lines(&result)
}

/// Delete a section from an INI-style file
pub fn delete_section(content: &str, section_name: &str) -> String {
    let mut result = String::new();
    let mut in_target_section = false;
    let mut skip_blank_line = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let section = trimmed[1..trimmed.len() - 1].trim();
            if section == section_name {
                in_target_section = true;
                skip_blank_line = true;
                continue;
            } else {
                in_target_section = false;
                skip_blank_line = false;
            }
        }

        if !in_target_section {
            // Skip one blank line after deleted section
            if skip_blank_line && trimmed.is_empty() {
                skip_blank_line = false;
                continue;
            }
            result.push_str(line);
            result.push('\n');
        }
    }

    cleanup_empty_lines(&result)
}

/// Clean up empty lines in INI files:
/// - Remove leading empty lines
/// - Ensure exactly one blank line between sections
/// - Remove trailing empty lines
fn cleanup_empty_lines(content: &str) -> String {
    let mut result = String::new();
    let mut previous_blank = false;
    let mut at_start = true;

    for line in content.lines() {
        let is_blank = line.trim().is_empty();

        if at_start && is_blank {
            continue;
        }
        if !is_blank {
            at_start = false;
        }
        if is_blank && previous_blank {
            continue;
        }

        result.push_str(line);
        result.push('\n');
        previous_blank = is_blank;
    }

    while result.ends_with("\n\n") {
        result.pop();
    }

    result
}
