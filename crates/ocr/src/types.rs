use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two charge kinds printed on toll statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TollCategory {
    Passagem,
    Estacionamento,
}

impl TollCategory {
    pub fn label(self) -> &'static str {
        match self {
            TollCategory::Passagem => "Passagem",
            TollCategory::Estacionamento => "Estacionamento",
        }
    }

    /// Finds a category keyword anywhere in `text`, ignoring case.
    /// "Estacionamento" wins when both appear.
    pub fn find_in(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("estacionamento") {
            Some(TollCategory::Estacionamento)
        } else if lower.contains("passagem") {
            Some(TollCategory::Passagem)
        } else {
            None
        }
    }
}

impl std::fmt::Display for TollCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Vehicle code plus licence plate as printed on the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleId {
    /// Three-digit fleet code.
    pub code: String,
    /// Seven-character plate (uppercase letters and digits).
    pub plate: String,
}

/// One reconstructed toll charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TollTransaction {
    /// Day and month exactly as read, e.g. "10 de março". No year.
    pub date: String,
    pub category: TollCategory,
    /// Exact, non-negative.
    pub amount: Decimal,
    pub vehicle: VehicleId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_in_is_case_insensitive() {
        assert_eq!(TollCategory::find_in("PASSAGEM R$ 5,00"), Some(TollCategory::Passagem));
        assert_eq!(TollCategory::find_in("estacionamento"), Some(TollCategory::Estacionamento));
        assert_eq!(TollCategory::find_in("Total"), None);
    }

    #[test]
    fn find_in_prefers_parking() {
        assert_eq!(
            TollCategory::find_in("Passagem / Estacionamento"),
            Some(TollCategory::Estacionamento)
        );
    }

    #[test]
    fn display_is_sheet_label() {
        assert_eq!(TollCategory::Passagem.to_string(), "Passagem");
        assert_eq!(TollCategory::Estacionamento.to_string(), "Estacionamento");
    }
}
