//! Conversational step navigation.
//!
//! [`NavigationState`] owns the cursor and its bounds. [`Navigator`] drives
//! the dialogue: it shows the ingredient list or the current step, reads a
//! command, classifies it, and applies the resulting transition until the
//! user is done. The loop is iterative, so session length is unbounded.

use tracing::{debug, info, instrument};

use souschef_search::SearchDispatch;
use souschef_shared::{RecipePredicates, Result, SousChefError};

use crate::intent::{Intent, IntentClassifier, Ordinal, QuestionTemplate, is_decline};
use crate::referent::resolve_referents;

const START_PROMPT: &str = "What would you like to do?\n\
    [1] Show the ingredient list\n\
    [2] Go to the first step\n";
const LISTING_PROMPT: &str = "Would you like to [1] move on to the first step or [2] repeat the list? ";
const CONFIRM_PROMPT: &str = "Does this answer your question? (Y or Yes/N or No): ";
const DECLINE_PROMPT: &str = "What should I do next then? ";
const UNRECOGNIZED_PROMPT: &str = "I'm afraid that I do not understand that command. \
    Please try again, and if there were numerical prompts, enter just the number: ";
const UNREACHABLE: &str = "You would be going to an unreachable step. Please try another command.";
const NO_ANSWER: &str = "Sorry, I couldn't find anything that answers that question.";
const FAREWELL: &str = "Looks like you're all done! Good work and enjoy your food! \
    Thanks for using Sous-chef and see you next time!";
const SEPARATOR: &str = "-----------------------------------------------------------------";

/// Rotated after every step display.
const NEXT_PROMPTS: &[&str] = &[
    "Let me know what you would like to do next. I can repeat the instruction too: ",
    "Ready for another command. Let me know if I should repeat what I just said: ",
    "Would you like me to repeat that? Otherwise, I am ready for whatever you would like to do next: ",
];

const START_OPTIONS: &[&str] = &["1", "2"];
const LISTING_OPTIONS: &[&str] = &["1", "2"];
const YES_NO: &[&str] = &["yes", "no", "y", "n"];

/// Line-oriented user I/O.
pub trait Console {
    fn say(&mut self, text: &str);

    /// Show `prompt` and read one line. End of input is [`SousChefError::InputClosed`].
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Where the dialogue currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Listing,
    Step(usize),
    Done,
}

/// Cursor over the instruction list. `current == total` means done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    current: usize,
    total: usize,
}

impl NavigationState {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.total
    }

    pub fn screen(&self) -> Screen {
        if self.is_done() {
            Screen::Done
        } else {
            Screen::Step(self.current)
        }
    }

    /// Past the last step is done, not an error.
    pub fn forward(&mut self) {
        self.current = (self.current + 1).min(self.total);
    }

    pub fn backward(&mut self) -> Result<()> {
        if self.current == 0 {
            return Err(SousChefError::StepOutOfRange {
                requested: 0,
                total: self.total,
            });
        }
        self.current -= 1;
        Ok(())
    }

    /// Jump to a one-based step. Out-of-range requests leave the cursor alone.
    pub fn jump(&mut self, ordinal: Ordinal) -> Result<()> {
        self.current = match ordinal {
            Ordinal::First => 0,
            Ordinal::Last => self.total.saturating_sub(1),
            Ordinal::Number(n) => {
                if n <= 0 || n > self.total as i64 {
                    return Err(SousChefError::StepOutOfRange {
                        requested: n,
                        total: self.total,
                    });
                }
                (n - 1) as usize
            }
        };
        Ok(())
    }

    pub fn finish(&mut self) {
        self.current = self.total;
    }
}

/// "1st", "2nd", "3rd", then "4th", "11th", "21th" onwards.
pub fn step_label(index: usize) -> String {
    match index {
        0 => "1st".to_string(),
        1 => "2nd".to_string(),
        2 => "3rd".to_string(),
        n => format!("{}th", n + 1),
    }
}

/// Runs one cooking conversation over a recipe's predicates.
pub struct Navigator<'a> {
    predicates: &'a RecipePredicates,
    search: &'a SearchDispatch,
    classifier: IntentClassifier,
    state: NavigationState,
    screen: Screen,
    turns: usize,
}

impl<'a> Navigator<'a> {
    pub fn new(
        predicates: &'a RecipePredicates,
        search: &'a SearchDispatch,
        classifier: IntentClassifier,
    ) -> Self {
        Self {
            predicates,
            search,
            classifier,
            state: NavigationState::new(predicates.total_steps()),
            screen: Screen::Listing,
            turns: 0,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Ask where to start, then converse until done.
    ///
    /// A recipe with no steps skips the start menu and says goodbye.
    pub async fn run(&mut self, console: &mut dyn Console) -> Result<()> {
        if self.state.is_done() {
            self.screen = Screen::Done;
            return self.converse(console).await;
        }
        self.screen = match self.menu(console, START_PROMPT, START_OPTIONS)? {
            0 => Screen::Listing,
            1 => self.state.screen(),
            other => {
                return Err(SousChefError::invariant(format!(
                    "start menu returned option {other}"
                )));
            }
        };
        self.converse(console).await
    }

    /// Converse from the current screen until done.
    #[instrument(skip_all, fields(steps = self.state.total()))]
    pub async fn converse(&mut self, console: &mut dyn Console) -> Result<()> {
        let mut show_step = true;

        loop {
            match self.screen {
                Screen::Done => {
                    info!("conversation finished");
                    console.say(FAREWELL);
                    return Ok(());
                }
                Screen::Listing => {
                    self.list_ingredients(console);
                    match self.menu(console, LISTING_PROMPT, LISTING_OPTIONS)? {
                        0 => {
                            self.state.jump(Ordinal::First)?;
                            self.screen = self.state.screen();
                            show_step = true;
                        }
                        1 => {}
                        other => {
                            return Err(SousChefError::invariant(format!(
                                "listing menu returned option {other}"
                            )));
                        }
                    }
                }
                Screen::Step(index) => {
                    if show_step {
                        self.show_step(index, console)?;
                    }
                    let prompt = NEXT_PROMPTS[self.turns % NEXT_PROMPTS.len()];
                    self.turns += 1;

                    let intent = self.read_intent(console, prompt)?;
                    show_step = self.apply(intent, console).await?;
                    self.screen = self.state.screen();
                }
            }
        }
    }

    /// Apply one intent. Returns whether the (possibly new) step should be shown.
    async fn apply(&mut self, intent: Intent, console: &mut dyn Console) -> Result<bool> {
        debug!(?intent, current = self.state.current(), "applying intent");
        match intent {
            Intent::Forward => self.state.forward(),
            Intent::Backward => {
                if self.state.backward().is_err() {
                    console.say(UNREACHABLE);
                    return Ok(false);
                }
            }
            Intent::Beginning => self.state.jump(Ordinal::First)?,
            Intent::Ending => self.state.jump(Ordinal::Last)?,
            Intent::Done => self.state.finish(),
            Intent::Repeat => {}
            Intent::OrdinalJump(ordinal) => match self.state.jump(ordinal) {
                Ok(()) => {}
                Err(SousChefError::StepOutOfRange { requested, total }) if requested > 0 => {
                    console.say(&format!(
                        "This recipe does not have quite that many steps. \
                         Please try another command. There are {total} steps in total."
                    ));
                    return Ok(false);
                }
                Err(SousChefError::StepOutOfRange { .. }) => {
                    console.say(UNREACHABLE);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            },
            Intent::Question { template, text } => {
                self.answer(template, &text, console).await?;
                return Ok(false);
            }
            Intent::Unrecognized => {
                return Err(SousChefError::invariant(
                    "unrecognized intent escaped command resolution",
                ));
            }
        }
        Ok(true)
    }

    /// Prompt until the reply classifies. "no" re-asks with a softer prompt.
    fn read_intent(&self, console: &mut dyn Console, prompt: &str) -> Result<Intent> {
        let mut prompt = prompt;
        loop {
            let reply = console.ask(prompt)?;
            if is_decline(&reply) {
                prompt = DECLINE_PROMPT;
                continue;
            }
            match self.classifier.classify(&reply) {
                Intent::Unrecognized => prompt = UNRECOGNIZED_PROMPT,
                intent => return Ok(intent),
            }
        }
    }

    /// Prompt until the reply is one of `options`; returns its position.
    fn menu(&self, console: &mut dyn Console, prompt: &str, options: &[&str]) -> Result<usize> {
        let mut prompt = prompt;
        loop {
            let reply = console.ask(prompt)?.trim().to_lowercase();
            if let Some(position) = options.iter().position(|o| *o == reply) {
                return Ok(position);
            }
            prompt = UNRECOGNIZED_PROMPT;
        }
    }

    fn list_ingredients(&self, console: &mut dyn Console) {
        console.say("Here are the ingredients:");
        for ingredient in &self.predicates.ingredients {
            console.say(&ingredient.line);
        }
    }

    fn show_step(&self, index: usize, console: &mut dyn Console) -> Result<()> {
        let step = self.predicates.instruction(index).ok_or_else(|| {
            SousChefError::invariant(format!("step {index} missing from predicates"))
        })?;
        console.say(SEPARATOR);
        console.say(&format!("The {} step is: {}", step_label(index), step.sentence));
        console.say(SEPARATOR);
        Ok(())
    }

    #[instrument(skip(self, console))]
    async fn answer(
        &self,
        template: QuestionTemplate,
        question: &str,
        console: &mut dyn Console,
    ) -> Result<()> {
        if template == QuestionTemplate::HowManySteps {
            console.say(&format!("There are {} steps.", self.state.total()));
            return Ok(());
        }

        let index = self.state.current();
        let step = self.predicates.instruction(index).ok_or_else(|| {
            SousChefError::invariant(format!("step {index} missing from predicates"))
        })?;
        let query = help_query(question, &step.sentence, self.predicates);
        info!(%query, "looking for help");

        if let Some(hit) = self.search.video(&query).await {
            console.say(&format!(
                "There's a video that may be of some help. Check this out: {}",
                hit.url
            ));
            match self.menu(console, CONFIRM_PROMPT, YES_NO)? {
                0 | 2 => return Ok(()),
                1 | 3 => {}
                other => {
                    return Err(SousChefError::invariant(format!(
                        "confirmation returned option {other}"
                    )));
                }
            }
            return self.web_fallback(&query, "additional ", console).await;
        }

        self.web_fallback(&query, "", console).await
    }

    async fn web_fallback(&self, query: &str, extra: &str, console: &mut dyn Console) -> Result<()> {
        match self.search.web(query).await {
            Some(hit) => console.say(&format!(
                "There's a web result that may be of some {extra}help. Check this out: {}",
                hit.url
            )),
            None => console.say(NO_ANSWER),
        }
        Ok(())
    }
}

/// "How do I do that" asks about the whole step; anything else gets its
/// referents resolved.
pub fn help_query(question: &str, step: &str, predicates: &RecipePredicates) -> String {
    let lower = question.to_lowercase();
    if lower.contains("how do i do that") || lower.contains("how to do that") {
        return format!("How do I {step}");
    }
    resolve_referents(question, step, predicates)
}
