// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory storage for the drink catalog and the trivia game.
//!
//! Ids are assigned sequentially starting at 1 and never reused. All
//! listings are ordered by id.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;

use crate::error::ApiError;
use crate::models::{Category, Drink, NewQuestion, Question, RecipePart, UpdateDrinkRequest};

pub const QUESTIONS_PER_PAGE: usize = 10;

/// One page of a listing plus the size of the whole listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Slice `items` to 1-based `page`. Page 0 is always empty.
fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    let page_items = match page.checked_sub(1) {
        Some(index) => items
            .iter()
            .skip(index.saturating_mul(QUESTIONS_PER_PAGE))
            .take(QUESTIONS_PER_PAGE)
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    Page {
        items: page_items,
        total: items.len(),
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    drinks: BTreeMap<i64, Drink>,
    last_drink_id: i64,
    categories: BTreeMap<i64, Category>,
    last_category_id: i64,
    questions: BTreeMap<i64, Question>,
    last_question_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Drinks
    // -------------------------------------------------------------------------

    pub fn list_drinks(&self) -> Vec<Drink> {
        self.drinks.values().cloned().collect()
    }

    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|drink| drink.title == title && Some(drink.id) != except)
    }

    pub fn create_drink(&mut self, title: String, recipe: Vec<RecipePart>) -> Result<Drink, ApiError> {
        let title = validate_title(title)?;
        if self.title_taken(&title, None) {
            return Err(ApiError::unprocessable(format!(
                "a drink titled `{title}` already exists"
            )));
        }

        self.last_drink_id += 1;
        let drink = Drink {
            id: self.last_drink_id,
            title,
            recipe,
        };
        self.drinks.insert(drink.id, drink.clone());
        Ok(drink)
    }

    pub fn update_drink(&mut self, drink_id: i64, request: UpdateDrinkRequest) -> Result<Drink, ApiError> {
        if !self.drinks.contains_key(&drink_id) {
            return Err(ApiError::not_found("resource not found"));
        }

        let title = request.title.map(validate_title).transpose()?;
        if let Some(title) = &title {
            if self.title_taken(title, Some(drink_id)) {
                return Err(ApiError::unprocessable(format!(
                    "a drink titled `{title}` already exists"
                )));
            }
        }

        let drink = self
            .drinks
            .get_mut(&drink_id)
            .ok_or_else(|| ApiError::not_found("resource not found"))?;
        if let Some(title) = title {
            drink.title = title;
        }
        if let Some(recipe) = request.recipe {
            drink.recipe = recipe.into_parts();
        }
        Ok(drink.clone())
    }

    pub fn delete_drink(&mut self, drink_id: i64) -> Result<(), ApiError> {
        if self.drinks.remove(&drink_id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("resource not found"))
        }
    }

    // -------------------------------------------------------------------------
    // Trivia
    // -------------------------------------------------------------------------

    pub fn insert_category(&mut self, kind: impl Into<String>) -> Category {
        self.last_category_id += 1;
        let category = Category {
            id: self.last_category_id,
            kind: kind.into(),
        };
        self.categories.insert(category.id, category.clone());
        category
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.values().cloned().collect()
    }

    /// Category types keyed by id.
    pub fn category_map(&self) -> BTreeMap<i64, String> {
        self.categories
            .values()
            .map(|category| (category.id, category.kind.clone()))
            .collect()
    }

    pub fn category(&self, category_id: i64) -> Option<&Category> {
        self.categories.get(&category_id)
    }

    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.get(&question_id)
    }

    /// A page of all questions; an empty page is a 404.
    pub fn questions_page(&self, page: usize) -> Result<Page<Question>, ApiError> {
        let all: Vec<Question> = self.questions.values().cloned().collect();
        non_empty(paginate(&all, page))
    }

    /// A page of one category's questions; an unknown category or an
    /// empty page is a 404.
    pub fn category_questions_page(
        &self,
        category_id: i64,
        page: usize,
    ) -> Result<(Category, Page<Question>), ApiError> {
        let category = self
            .category(category_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("resource not found"))?;
        let matching: Vec<Question> = self
            .questions
            .values()
            .filter(|question| question.category == category_id)
            .cloned()
            .collect();
        Ok((category, non_empty(paginate(&matching, page))?))
    }

    /// Case-insensitive substring search over question text. No match is
    /// an empty page, not an error.
    pub fn search_questions(&self, term: &str, page: usize) -> Page<Question> {
        let needle = term.to_lowercase();
        let matching: Vec<Question> = self
            .questions
            .values()
            .filter(|question| question.question.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        paginate(&matching, page)
    }

    pub fn create_question(&mut self, new: NewQuestion) -> Result<Question, ApiError> {
        if self.category(new.category).is_none() {
            return Err(ApiError::unprocessable(format!(
                "category {} does not exist",
                new.category
            )));
        }

        self.last_question_id += 1;
        let question = Question {
            id: self.last_question_id,
            question: new.question,
            answer: new.answer,
            category: new.category,
            difficulty: new.difficulty,
        };
        self.questions.insert(question.id, question.clone());
        Ok(question)
    }

    pub fn delete_question(&mut self, question_id: i64) -> Result<(), ApiError> {
        if self.questions.remove(&question_id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("resource not found"))
        }
    }

    /// A uniformly random question of `category_id` (`0` for any category)
    /// that is not in `previous`. `None` once the round is exhausted.
    pub fn quiz_question(&self, category_id: i64, previous: &[i64]) -> Result<Option<Question>, ApiError> {
        if category_id != 0 && self.category(category_id).is_none() {
            return Err(ApiError::not_found("resource not found"));
        }

        let candidates: Vec<&Question> = self
            .questions
            .values()
            .filter(|question| category_id == 0 || question.category == category_id)
            .filter(|question| !previous.contains(&question.id))
            .collect();
        Ok(candidates.choose(&mut rand::rng()).map(|question| (*question).clone()))
    }

    // -------------------------------------------------------------------------
    // Sample data
    // -------------------------------------------------------------------------

    /// A store holding the demo menu and trivia deck.
    pub fn seeded() -> Self {
        let mut store = Self::new();

        for kind in ["Science", "Art", "Geography", "History", "Entertainment", "Sports"] {
            store.insert_category(kind);
        }

        let questions: [(&str, &str, i64, i32); 15] = [
            ("What is the heaviest organ in the human body?", "The Liver", 1, 4),
            ("Who discovered penicillin?", "Alexander Fleming", 1, 3),
            ("Hematology is a branch of medicine involving the study of what?", "Blood", 1, 4),
            ("Which Dutch graphic artist, initials M C, was a creator of optical illusions?", "Escher", 2, 1),
            ("La Giaconda is better known as what?", "Mona Lisa", 2, 3),
            ("How many paintings did Van Gogh sell in his lifetime?", "One", 2, 4),
            ("What is the largest lake in Africa?", "Lake Victoria", 3, 2),
            ("In which royal palace would you find the Hall of Mirrors?", "The Palace of Versailles", 3, 3),
            ("The Taj Mahal is located in which Indian city?", "Agra", 3, 2),
            ("Whose autobiography is entitled 'I Know Why the Caged Bird Sings'?", "Maya Angelou", 4, 2),
            ("What boxer's original name is Cassius Clay?", "Muhammad Ali", 4, 1),
            ("Who invented Peanut Butter?", "George Washington Carver", 4, 2),
            ("What movie earned Tom Hanks his third straight Oscar nomination, in 1996?", "Apollo 13", 5, 4),
            ("Which is the only team to play in every soccer World Cup tournament?", "Brazil", 6, 3),
            ("Which country won the first ever soccer World Cup in 1930?", "Uruguay", 6, 4),
        ];
        for (question, answer, category, difficulty) in questions {
            store.seed_question(question, answer, category, difficulty);
        }

        store.seed_drink("water", &[("water", "blue", 1)]);
        store.seed_drink("matcha shake", &[("milk", "grey", 1), ("matcha", "green", 3)]);

        store
    }

    fn seed_question(&mut self, question: &str, answer: &str, category: i64, difficulty: i32) {
        self.last_question_id += 1;
        let question = Question {
            id: self.last_question_id,
            question: question.to_string(),
            answer: answer.to_string(),
            category,
            difficulty,
        };
        self.questions.insert(question.id, question);
    }

    fn seed_drink(&mut self, title: &str, recipe: &[(&str, &str, u32)]) {
        self.last_drink_id += 1;
        let drink = Drink {
            id: self.last_drink_id,
            title: title.to_string(),
            recipe: recipe
                .iter()
                .map(|(name, color, parts)| RecipePart {
                    name: name.to_string(),
                    color: color.to_string(),
                    parts: *parts,
                })
                .collect(),
        };
        self.drinks.insert(drink.id, drink);
    }
}

fn validate_title(title: String) -> Result<String, ApiError> {
    let title = title.trim().to_string();
    if title.is_empty() {
        Err(ApiError::unprocessable("drink title must not be empty"))
    } else {
        Ok(title)
    }
}

fn non_empty<T>(page: Page<T>) -> Result<Page<T>, ApiError> {
    if page.items.is_empty() {
        Err(ApiError::not_found("resource not found"))
    } else {
        Ok(page)
    }
}
