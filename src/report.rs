use crate::errors::AppError;
use crate::models::{DateEntry, DrinkingDetails, GamblingDetails};

pub fn headers() -> Vec<String> {
    let mut headers = vec![
        "date".to_string(),
        "has_drinking".to_string(),
        "has_gambling".to_string(),
    ];
    headers.extend(DrinkingDetails::FIELDS.iter().map(|name| format!("drinking_{name}")));
    headers.extend(GamblingDetails::FIELDS.iter().map(|name| format!("gambling_{name}")));
    headers
}

/// One CSV row per date; entries are expected sorted and non-empty.
pub fn render_csv(entries: &[DateEntry]) -> Result<String, AppError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(headers())?;

        for entry in entries {
            let date = entry.date.to_string();
            let drinking = entry.drinking.as_ref().map(|d| &d.details);
            let gambling = entry.gambling.as_ref().map(|g| &g.details);

            let mut row: Vec<&str> = vec![
                date.as_str(),
                bool_str(drinking.is_some()),
                bool_str(gambling.is_some()),
            ];
            match drinking {
                Some(details) => row.extend(details.values().map(|value| value.unwrap_or(""))),
                None => row.extend(std::iter::repeat_n("", DrinkingDetails::FIELDS.len())),
            }
            match gambling {
                Some(details) => row.extend(details.values().map(|value| value.unwrap_or(""))),
                None => row.extend(std::iter::repeat_n("", GamblingDetails::FIELDS.len())),
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
    }
    String::from_utf8(buffer).map_err(AppError::internal)
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
