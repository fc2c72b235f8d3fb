//! Turn-by-turn collection of the payee's details before any receipt is accepted.

use chrono::NaiveDate;

use crate::payee::PayeeProfile;
use crate::period::{parse_br_date, DateRange};

const GREETINGS: &[&str] = &["oi", "olá", "ola", "bom dia", "boa tarde", "boa noite", "hey", "eae"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStep {
    Name,
    TaxId,
    Bank,
    BranchAccount,
    PixKey,
    PeriodStart,
    PeriodEnd,
    Done,
}

impl IntakeStep {
    pub fn prompt(self) -> &'static str {
        match self {
            IntakeStep::Name => "Qual o seu nome completo?",
            IntakeStep::TaxId => "Informe o CPF ou CNPJ:",
            IntakeStep::Bank => "Qual o banco?",
            IntakeStep::BranchAccount => "Informe Agência e C/C:",
            IntakeStep::PixKey => "Qual a chave PIX?",
            IntakeStep::PeriodStart => "Data Inicial: (DD/MM/AAAA)",
            IntakeStep::PeriodEnd => "Data Final: (DD/MM/AAAA)",
            IntakeStep::Done => "",
        }
    }

    fn next(self) -> Self {
        match self {
            IntakeStep::Name => IntakeStep::TaxId,
            IntakeStep::TaxId => IntakeStep::Bank,
            IntakeStep::Bank => IntakeStep::BranchAccount,
            IntakeStep::BranchAccount => IntakeStep::PixKey,
            IntakeStep::PixKey => IntakeStep::PeriodStart,
            IntakeStep::PeriodStart => IntakeStep::PeriodEnd,
            IntakeStep::PeriodEnd | IntakeStep::Done => IntakeStep::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeReply {
    /// Send this question back to the user.
    Ask(String),
    /// The last answer was accepted; persist the profile, then call
    /// [`IntakeSession::confirm`].
    Completed(PayeeProfile),
    /// Intake already finished; the message is not for this flow.
    Done,
}

#[derive(Debug, Clone, Default)]
struct Draft {
    name: String,
    tax_id: String,
    bank: String,
    branch_account: String,
    pix_key: String,
    start: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct IntakeSession {
    step: IntakeStep,
    draft: Draft,
}

impl Default for IntakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeSession {
    pub fn new() -> Self {
        IntakeSession { step: IntakeStep::Name, draft: Draft::default() }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == IntakeStep::Done
    }

    /// Close the session once the completed profile has been stored.
    pub fn confirm(&mut self) {
        self.step = IntakeStep::Done;
        self.draft = Draft::default();
    }

    /// Feed one inbound text message to the session.
    pub fn respond(&mut self, text: &str) -> IntakeReply {
        let text = text.trim();
        match self.step {
            IntakeStep::Done => return IntakeReply::Done,
            IntakeStep::Name if text.is_empty() || is_greeting(text) => {
                return ask(IntakeStep::Name.prompt());
            }
            IntakeStep::PeriodStart | IntakeStep::PeriodEnd => return self.respond_date(text),
            IntakeStep::Name => self.draft.name = text.to_string(),
            // Blank answers leave the field empty and move on.
            IntakeStep::TaxId => self.draft.tax_id = text.to_string(),
            IntakeStep::Bank => self.draft.bank = text.to_string(),
            IntakeStep::BranchAccount => self.draft.branch_account = text.to_string(),
            IntakeStep::PixKey => self.draft.pix_key = text.to_string(),
        }
        self.step = self.step.next();
        ask(self.step.prompt())
    }

    fn respond_date(&mut self, text: &str) -> IntakeReply {
        let date = match parse_br_date(text) {
            Ok(date) => date,
            Err(_) => {
                return ask(&format!("Data inválida. {}", self.step.prompt()));
            }
        };

        match (self.step, self.draft.start) {
            (IntakeStep::PeriodStart, _) => {
                self.draft.start = Some(date);
                self.step = self.step.next();
                ask(self.step.prompt())
            }
            (IntakeStep::PeriodEnd, Some(start)) => match DateRange::new(start, date) {
                // Stays on the end step until confirmed, so a failed save can be retried.
                Ok(period) => IntakeReply::Completed(PayeeProfile {
                    name: self.draft.name.clone(),
                    tax_id: self.draft.tax_id.clone(),
                    bank: self.draft.bank.clone(),
                    branch_account: self.draft.branch_account.clone(),
                    pix_key: self.draft.pix_key.clone(),
                    period,
                }),
                Err(_) => ask(&format!(
                    "A data final não pode ser anterior à data inicial. {}",
                    self.step.prompt()
                )),
            },
            // Unreachable in practice: the end step is only entered after a start date.
            _ => {
                self.step = IntakeStep::PeriodStart;
                ask(self.step.prompt())
            }
        }
    }
}

fn ask(prompt: &str) -> IntakeReply {
    IntakeReply::Ask(prompt.to_string())
}

fn is_greeting(text: &str) -> bool {
    let lower = text.to_lowercase();
    GREETINGS.contains(&lower.as_str())
}
