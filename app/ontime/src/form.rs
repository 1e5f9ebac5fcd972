//! Line-oriented form session
//!
//! Holds one value per input control. Values only change through commands
//! that pass the field's domain check, so `:submit` always assembles a valid
//! record.

use ontime_insight::{FieldError, FieldKey, ShipmentRecord};

/// What the caller should do after a line was handled
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// Print these lines and keep reading
    Output(Vec<String>),
    /// Run the pipeline on this record
    Submit(ShipmentRecord),
    Quit,
}

#[derive(Debug, Default)]
pub struct FormSession {
    values: ShipmentRecord,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &'static str {
        "ontime> "
    }

    pub fn values(&self) -> &ShipmentRecord {
        &self.values
    }

    pub fn intro() -> Vec<String> {
        vec![
            "Delivery performance form".to_string(),
            "set fields with `field=value`, `:show` the form, `:submit` to predict, `:help` for more"
                .to_string(),
        ]
    }

    pub fn handle_line(&mut self, line: &str) -> FormEvent {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return FormEvent::Output(Vec::new());
        }
        if trimmed.starts_with(':') {
            return self.handle_command(trimmed);
        }

        let (name, value) = match trimmed.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => match trimmed.split_once(char::is_whitespace) {
                Some((name, value)) => (name, Some(value.trim())),
                None => (trimmed, None),
            },
        };

        let key = match name.parse::<FieldKey>() {
            Ok(key) => key,
            Err(e) => return FormEvent::Output(vec![format!("error: {e} (try :help)")]),
        };
        match value {
            None | Some("") => FormEvent::Output(vec![self.describe(key)]),
            Some(value) => match self.set(key, value) {
                Ok(()) => FormEvent::Output(vec![format!(
                    "{} = {}",
                    key,
                    key.value_of(&self.values)
                )]),
                Err(e) => FormEvent::Output(vec![format!("error: {e}")]),
            },
        }
    }

    fn handle_command(&mut self, command: &str) -> FormEvent {
        match command {
            ":q" | ":quit" | ":exit" => FormEvent::Quit,
            ":submit" | ":s" => FormEvent::Submit(self.values),
            ":show" => FormEvent::Output(self.show()),
            ":reset" => {
                self.values = ShipmentRecord::default();
                FormEvent::Output(vec!["form reset to defaults".to_string()])
            }
            ":help" => FormEvent::Output(Self::help()),
            other => FormEvent::Output(vec![format!("error: unknown command '{other}'")]),
        }
    }

    /// Validates `value` against the field's domain and stores it.
    /// On error the previous value is kept.
    pub fn set(&mut self, key: FieldKey, value: &str) -> Result<(), FieldError> {
        let v = &mut self.values;
        match key {
            FieldKey::Weather => v.weather = value.parse()?,
            FieldKey::Vehicle => v.vehicle = value.parse()?,
            FieldKey::City => v.city = value.parse()?,
            FieldKey::Festival => v.festival = value.parse()?,
            FieldKey::Traffic => v.traffic = value.parse()?,
            FieldKey::DriverAge => v.driver_age = value.parse()?,
            FieldKey::DriverRating => v.driver_rating = value.parse()?,
            FieldKey::Distance => v.distance_km = value.parse()?,
            FieldKey::Deliveries => v.deliveries = value.parse()?,
            FieldKey::VehicleCondition => v.vehicle_condition = value.parse()?,
        }
        Ok(())
    }

    fn describe(&self, key: FieldKey) -> String {
        format!(
            "{} ({}) = {}   [{}]",
            key.label(),
            key,
            key.value_of(&self.values),
            key.domain()
        )
    }

    pub fn show(&self) -> Vec<String> {
        FieldKey::ALL
            .iter()
            .map(|key| format!("{:<26} {}", key.label(), key.value_of(&self.values)))
            .collect()
    }

    pub fn help() -> Vec<String> {
        let mut lines = vec![
            "commands: :submit, :show, :reset, :help, :quit".to_string(),
            "set a field with `field=value` or `field value`; `field` alone shows it".to_string(),
            "fields:".to_string(),
        ];
        lines.extend(
            FieldKey::ALL
                .iter()
                .map(|key| format!("  {:<11} {}", key.key(), key.domain())),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontime_insight::{TrafficDensity, VehicleType, Weather};
    use pretty_assertions::assert_eq;

    fn output(event: FormEvent) -> Vec<String> {
        match event {
            FormEvent::Output(lines) => lines,
            other => panic!("expected output, got {other:?}"),
        }
    }

    #[test]
    fn nothing_is_submitted_until_asked() {
        let mut s = FormSession::new();
        output(s.handle_line("traffic=Jam"));
        output(s.handle_line("distance 20"));
        match s.handle_line(":submit") {
            FormEvent::Submit(record) => {
                assert_eq!(record.traffic, TrafficDensity::Jam);
                assert_eq!(record.distance_km.get(), 20.0);
                assert_eq!(record.weather, Weather::Windy);
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn values_are_canonicalized() {
        let mut s = FormSession::new();
        let out = output(s.handle_line("Type_of_vehicle = ELECTRIC_scooter"));
        assert_eq!(out, vec!["vehicle = electric_scooter"]);
        assert_eq!(s.values().vehicle, VehicleType::ElectricScooter);
    }

    #[test]
    fn rejected_input_keeps_previous_value() {
        let mut s = FormSession::new();
        output(s.handle_line("age=33"));
        let out = output(s.handle_line("age=41"));
        assert!(out[0].starts_with("error: age must be between 20 and 40"));
        assert_eq!(s.values().driver_age.get(), 33);

        let out = output(s.handle_line("weather=Rainy"));
        assert!(out[0].contains("not a valid weather"));
        assert_eq!(s.values().weather, Weather::Windy);
    }

    #[test]
    fn unknown_fields_and_commands() {
        let mut s = FormSession::new();
        assert!(output(s.handle_line("speed=3"))[0].contains("unknown field 'speed'"));
        assert!(output(s.handle_line(":frobnicate"))[0].contains("unknown command"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut s = FormSession::new();
        output(s.handle_line("festival=yes"));
        output(s.handle_line(":reset"));
        assert_eq!(*s.values(), ShipmentRecord::default());
    }

    #[test]
    fn show_and_help_list_every_field() {
        let s = FormSession::new();
        assert_eq!(s.show().len(), FieldKey::ALL.len());
        let help = FormSession::help();
        assert!(help[0].starts_with("commands:"));
        assert!(help.iter().any(|l| l.contains("Low | Medium | High | Jam")));
    }

    #[test]
    fn field_alone_describes_it() {
        let mut s = FormSession::new();
        let out = output(s.handle_line("rating"));
        assert_eq!(out, vec!["Driver rating (rating) = 4   [1..=5]"]);
    }

    #[test]
    fn quit_aliases() {
        let mut s = FormSession::new();
        for cmd in [":q", ":quit", ":exit"] {
            assert_eq!(s.handle_line(cmd), FormEvent::Quit);
        }
    }
}
