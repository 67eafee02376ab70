//! QuickList form screen demo
//!
//! Assembles a mixed list of form fields and person/animal/furniture cards
//! with headless card views, types into the form fields the way a keyboard
//! would, then prints the collected form values.
//!
//! Run with: RUST_LOG=quicklist=debug cargo run -p quicklist --example form_screen

use std::sync::Arc;

use quicklist::{
    EditOp, Listable, ListableAdapter, ListableId, ListableType, QUICK_FORM_INPUT,
    QuickFormInputElement, QuickFormInputType, RowView, TextInput,
};
use tracing_subscriber::EnvFilter;

const PERSON: ListableType = ListableType::new("person", 1);
const ANIMAL: ListableType = ListableType::new("animal", 2);
const FURNITURE: ListableType = ListableType::new("furniture", 3);

/// Every kind of row the screen shows.
#[derive(Debug, Clone, PartialEq)]
enum ScreenItem {
    Form(QuickFormInputElement),
    Person { id: u64, name: String, town: String },
    Animal { id: u64, name: String },
    Furniture { id: u64, name: String, rating: u8 },
}

impl Listable for ScreenItem {
    fn identifier(&self) -> ListableId {
        match self {
            Self::Form(element) => element.identifier(),
            Self::Person { id, .. } | Self::Animal { id, .. } | Self::Furniture { id, .. } => {
                (*id).into()
            }
        }
    }

    fn listable_type(&self) -> Option<ListableType> {
        match self {
            Self::Form(_) => Some(QUICK_FORM_INPUT),
            Self::Person { .. } => None,
            Self::Animal { .. } => Some(ANIMAL),
            Self::Furniture { .. } => Some(FURNITURE),
        }
    }

    fn form_input(&self) -> Option<&QuickFormInputElement> {
        match self {
            Self::Form(element) => Some(element),
            _ => None,
        }
    }

    fn form_input_mut(&mut self) -> Option<&mut QuickFormInputElement> {
        match self {
            Self::Form(element) => Some(element),
            _ => None,
        }
    }
}

/// Headless stand-in for a platform card layout.
#[derive(Debug, Default)]
struct Card {
    lines: Vec<String>,
    input: Option<Arc<TextInput>>,
    rating: Option<Arc<TextInput>>,
}

impl Card {
    fn with_input() -> Self {
        Self {
            input: Some(Arc::new(TextInput::new())),
            ..Self::default()
        }
    }

    fn with_rating() -> Self {
        Self {
            rating: Some(Arc::new(TextInput::new())),
            ..Self::default()
        }
    }
}

impl RowView for Card {
    fn find_input(&self, tag: &str) -> Option<Arc<TextInput>> {
        match tag {
            "input" => self.input.clone(),
            "rating" => self.rating.clone(),
            _ => None,
        }
    }
}

fn form_fields() -> Vec<ScreenItem> {
    vec![
        QuickFormInputElement::new("firstname", "firstname")
            .with_hint("Firstname")
            .with_placeholder("Kwame"),
        QuickFormInputElement::new("lastname", "lastname")
            .with_hint("Lastname")
            .with_placeholder("Mensah"),
        QuickFormInputElement::new("date", "date")
            .with_hint("Date")
            .with_input_type(QuickFormInputType::Date)
            .with_text_watcher(|text| tracing::info!(date = text, "date picked")),
        QuickFormInputElement::new("time", "time")
            .with_hint("Time")
            .with_input_type(QuickFormInputType::Time),
    ]
    .into_iter()
    .map(ScreenItem::Form)
    .collect()
}

fn cards() -> Vec<ScreenItem> {
    vec![
        ScreenItem::Person {
            id: 1,
            name: "Adwoa".into(),
            town: "Kasoa".into(),
        },
        ScreenItem::Animal {
            id: 2,
            name: "Cassava".into(),
        },
        ScreenItem::Furniture {
            id: 3,
            name: "Rocking chair".into(),
            rating: 4,
        },
    ]
}

fn bind(item: &ScreenItem, card: &mut Card, position: usize) {
    card.lines = match item {
        ScreenItem::Form(element) => {
            if let Some(input) = &card.input {
                input.set_text(element.value.clone());
            }
            vec![format!("{}: [{}]", element.hint, element.placeholder)]
        }
        ScreenItem::Person { name, town, .. } => vec![name.clone(), town.clone()],
        ScreenItem::Animal { name, .. } => vec![format!("animal {name}")],
        ScreenItem::Furniture { name, rating, .. } => {
            if let Some(field) = &card.rating {
                field.set_text(rating.to_string());
            }
            vec![name.clone()]
        }
    };
    tracing::debug!(position, lines = ?card.lines, "bound");
}

fn main() -> Result<(), quicklist::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let adapter = ListableAdapter::builder(PERSON)
        .with_listables(form_fields())
        .with_template(QUICK_FORM_INPUT, Card::with_input)
        .with_template(PERSON, Card::default)
        .with_template(ANIMAL, Card::default)
        .with_template(FURNITURE, Card::with_rating)
        .with_input_tags(["rating"])
        .on_bind(bind)
        .on_click(|item: &ScreenItem, card: &Card, position| {
            tracing::info!(position, id = %item.identifier(), lines = ?card.lines, "clicked");
        })
        .on_input_change(|item, position, value| {
            tracing::info!(
                position,
                id = %item.identifier(),
                tag = %value.tag,
                value = %value.value,
                "field edited"
            );
        })
        .build()?;

    adapter.signals().connect_updates(|op| match op {
        EditOp::Insert { position, count } => println!("insert {count} row(s) at {position}"),
        EditOp::Remove { position, count } => println!("remove {count} row(s) at {position}"),
        EditOp::Move { from, to } => println!("move row {from} -> {to}"),
        EditOp::Change { position, count } => println!("rebind {count} row(s) at {position}"),
    });

    let added = adapter.add_all(cards())?;
    println!("{added} cards added, {} rows in total", adapter.len());

    // Lay out every row once, as a list surface would on first display.
    let rows = (0..adapter.len())
        .map(|position| adapter.obtain_view(position))
        .collect::<Result<Vec<_>, _>>()?;

    for (row, text) in rows.iter().zip(["Kwame", "Mensah", "2024-05-01", "17:00"]) {
        let Some(input) = &row.view().input else {
            continue;
        };
        // One keystroke at a time.
        for end in 1..=text.len() {
            input.set_text(&text[..end]);
        }
        input.finish_editing();
    }

    if let Some(rating) = rows.last().and_then(|row| row.view().rating.clone()) {
        rating.commit_text("5");
    }
    if let Some(card) = rows.get(4) {
        adapter.click(card)?;
    }

    let mut values: Vec<_> = adapter.retrieve_form_values().into_iter().collect();
    values.sort();
    for (name, value) in values {
        println!("{name} = {value}");
    }

    for row in rows {
        adapter.recycle_view(row);
    }
    Ok(())
}
