use chrono::NaiveDate;

/// Month names for one language, passed explicitly wherever day-month text
/// has to be turned into a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthNames {
    /// January first; stored folded (lowercase, no diacritics).
    names: [String; 12],
}

impl MonthNames {
    pub fn new(names: [&str; 12]) -> Self {
        MonthNames { names: names.map(fold) }
    }

    pub fn pt_br() -> Self {
        Self::new([
            "janeiro", "fevereiro", "março", "abril", "maio", "junho",
            "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
        ])
    }

    /// 1-based month number. Case and accents are ignored so that OCR
    /// readings such as "MARCO" still resolve.
    pub fn month_number(&self, name: &str) -> Option<u32> {
        let folded = fold(name.trim());
        self.names
            .iter()
            .position(|n| *n == folded)
            .map(|i| i as u32 + 1)
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        Self::pt_br()
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Resolves yearless "D de MÊS" text against a reference year.
#[derive(Debug, Clone)]
pub struct DayMonthFormatter {
    pub months: MonthNames,
    pub year: i32,
}

impl DayMonthFormatter {
    pub fn new(months: MonthNames, year: i32) -> Self {
        DayMonthFormatter { months, year }
    }

    pub fn resolve(&self, text: &str) -> Option<NaiveDate> {
        let (day, month) = text.trim().split_once(" de ")?;
        let day: u32 = day.trim().parse().ok()?;
        let month = self.months.month_number(month)?;
        NaiveDate::from_ymd_opt(self.year, month, day)
    }

    /// `dd/mm/yyyy` when the text resolves, otherwise the text unchanged.
    pub fn format(&self, text: &str) -> String {
        match self.resolve(text) {
            Some(date) => date.format("%d/%m/%Y").to_string(),
            None => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_number_ignores_case_and_accents() {
        let months = MonthNames::pt_br();
        assert_eq!(months.month_number("março"), Some(3));
        assert_eq!(months.month_number("MARCO"), Some(3));
        assert_eq!(months.month_number("Dezembro"), Some(12));
        assert_eq!(months.month_number("march"), None);
    }

    #[test]
    fn custom_locale() {
        let months = MonthNames::new([
            "january", "february", "march", "april", "may", "june",
            "july", "august", "september", "october", "november", "december",
        ]);
        assert_eq!(months.month_number("March"), Some(3));
        assert_eq!(months.month_number("março"), None);
    }

    #[test]
    fn resolves_against_reference_year() {
        let f = DayMonthFormatter::new(MonthNames::pt_br(), 2025);
        assert_eq!(f.resolve("10 de março"), NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(f.format("7 de Janeiro"), "07/01/2025");
    }

    #[test]
    fn unresolvable_text_passes_through() {
        let f = DayMonthFormatter::new(MonthNames::pt_br(), 2025);
        assert_eq!(f.format("31 de fevereiro"), "31 de fevereiro");
        assert_eq!(f.format("15/03/2025"), "15/03/2025");
        assert_eq!(f.format("10 de marte"), "10 de marte");
    }
}
