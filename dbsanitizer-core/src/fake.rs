//! Fake data source for derived sanitization rules.
//!
//! [`FakeData`] drives the `fake` generators from one seedable RNG. A run
//! shares one instance across every row, so seeding it makes a whole run
//! reproducible. Generated emails always use reserved `example.*` domains.
//!
//! Every generator yields text except `Number` and `Boolean`. Text is bound
//! as a string parameter, so on PostgreSQL a `uuid` or `ipv4` rule only
//! fits a text-typed column; a `uuid`/`inet` column rejects the update.

use crate::models::Value;
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{IPv4, Password, SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Named fake-data generators, as referenced from the configuration file
/// (`email = { fake = "email" }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FakeKind {
    FirstName,
    LastName,
    Name,
    Username,
    Email,
    PhoneNumber,
    StreetAddress,
    City,
    Postcode,
    Company,
    Word,
    Sentence,
    Paragraph,
    Number,
    Boolean,
    Uuid,
    Ipv4,
    Password,
}

/// Randomness and fake-data source shared by every derived rule of a run.
#[derive(Debug, Clone)]
pub struct FakeData {
    rng: StdRng,
}

impl Default for FakeData {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeData {
    /// Creates a source seeded from operating system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a deterministic source; equal seeds yield equal sequences.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a source from an optional seed.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    /// Direct access to the underlying RNG for custom derived rules.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Produces a value for a named generator.
    pub fn generate(&mut self, kind: FakeKind) -> Value {
        match kind {
            FakeKind::FirstName => self.first_name().into(),
            FakeKind::LastName => self.last_name().into(),
            FakeKind::Name => self.name().into(),
            FakeKind::Username => self.username().into(),
            FakeKind::Email => self.email().into(),
            FakeKind::PhoneNumber => self.phone_number().into(),
            FakeKind::StreetAddress => self.street_address().into(),
            FakeKind::City => self.city().into(),
            FakeKind::Postcode => self.postcode().into(),
            FakeKind::Company => self.company().into(),
            FakeKind::Word => self.word().into(),
            FakeKind::Sentence => self.sentence(8).into(),
            FakeKind::Paragraph => self.paragraph(4).into(),
            FakeKind::Number => Value::Integer(self.number_between(0, 999_999)),
            FakeKind::Boolean => Value::Bool(self.boolean()),
            FakeKind::Uuid => self.uuid().into(),
            FakeKind::Ipv4 => self.ipv4().into(),
            FakeKind::Password => self.password(16).into(),
        }
    }

    pub fn first_name(&mut self) -> String {
        FirstName().fake_with_rng(&mut self.rng)
    }

    pub fn last_name(&mut self) -> String {
        LastName().fake_with_rng(&mut self.rng)
    }

    pub fn name(&mut self) -> String {
        Name().fake_with_rng(&mut self.rng)
    }

    pub fn username(&mut self) -> String {
        Username().fake_with_rng(&mut self.rng)
    }

    /// An address on a reserved example domain; not guaranteed unique.
    pub fn email(&mut self) -> String {
        SafeEmail().fake_with_rng(&mut self.rng)
    }

    pub fn phone_number(&mut self) -> String {
        PhoneNumber().fake_with_rng(&mut self.rng)
    }

    pub fn street_address(&mut self) -> String {
        let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        format!("{} {}", number, street)
    }

    pub fn city(&mut self) -> String {
        CityName().fake_with_rng(&mut self.rng)
    }

    pub fn postcode(&mut self) -> String {
        ZipCode().fake_with_rng(&mut self.rng)
    }

    pub fn company(&mut self) -> String {
        CompanyName().fake_with_rng(&mut self.rng)
    }

    pub fn word(&mut self) -> String {
        Word().fake_with_rng(&mut self.rng)
    }

    /// A sentence of `words` words ending with a period.
    pub fn sentence(&mut self, words: usize) -> String {
        let words = words.max(1);
        Sentence(words..words.saturating_add(1)).fake_with_rng(&mut self.rng)
    }

    pub fn paragraph(&mut self, sentences: usize) -> String {
        let sentences = sentences.max(1);
        Paragraph(sentences..sentences.saturating_add(1)).fake_with_rng(&mut self.rng)
    }

    /// Inclusive range; the bounds are swapped when given in reverse.
    pub fn number_between(&mut self, min: i64, max: i64) -> i64 {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        self.rng.random_range(low..=high)
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// A version 4 UUID drawn from this source's RNG.
    pub fn uuid(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    pub fn ipv4(&mut self) -> String {
        IPv4().fake_with_rng(&mut self.rng)
    }

    pub fn password(&mut self, length: usize) -> String {
        let length = length.max(1);
        Password(length..length.saturating_add(1)).fake_with_rng(&mut self.rng)
    }
}
