//! One chat turn, end to end.
//!
//! extract -> merge -> decide -> act. Every failure past the merge is caught
//! at this boundary and turned into the generic fallback reply; the HTTP
//! layer never sees an error from a turn.

use std::sync::Arc;

use tracing::{debug, error, info};

use fareflow_agent::{CityDirectory, SlotExtractor};
use fareflow_core::domain::session::{BookingStage, SessionContext, SlotUpdate};
use fareflow_core::errors::ApplicationError;
use fareflow_core::{
    decide_next_action, FlightCard, NextAction, Ranker, Reconciler, ResponseAssembler,
    StateSummary, ERROR_ACTIONS, ERROR_REPLY,
};
use fareflow_db::SessionStore;
use fareflow_providers::{BookingNotifier, PaymentLinkProvider, SearchQuery, SourceFanout};

#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub flight_cards: Vec<FlightCard>,
    pub state_summary: StateSummary,
    pub suggested_actions: Vec<String>,
    pub context_chip: String,
}

pub struct TurnHandler {
    extractor: SlotExtractor,
    cities: CityDirectory,
    assembler: ResponseAssembler,
    store: Arc<SessionStore>,
    fanout: SourceFanout,
    reconciler: Arc<Reconciler>,
    ranker: Ranker,
    payments: Arc<dyn PaymentLinkProvider>,
    notifier: Arc<dyn BookingNotifier>,
    max_offers_per_source: u32,
}

impl TurnHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<SessionStore>,
        fanout: SourceFanout,
        reconciler: Arc<Reconciler>,
        ranker: Ranker,
        payments: Arc<dyn PaymentLinkProvider>,
        notifier: Arc<dyn BookingNotifier>,
        max_offers_per_source: u32,
    ) -> Self {
        Self {
            extractor: SlotExtractor::new(),
            cities: CityDirectory::new(),
            assembler: ResponseAssembler::new(),
            store,
            fanout,
            reconciler,
            ranker,
            payments,
            notifier,
            max_offers_per_source,
        }
    }

    pub async fn handle_turn(&self, session_id: &str, message: &str) -> TurnOutcome {
        let update = self.extractor.extract(message);
        let extraction_hint = update.error_message.clone();
        let nothing_extracted = update == SlotUpdate::default();

        let context = self.store.merge(session_id, &update).await;
        let action = decide_next_action(&context);
        info!(
            event_name = "turn.decided",
            session_id = %session_id,
            action = ?action,
            "turn action decided"
        );

        let result = match action {
            NextAction::PromptMissing => {
                Ok(self.prompt(&context, extraction_hint, nothing_extracted))
            }
            NextAction::SearchFlights => self.search(session_id, context).await,
            NextAction::RequestPayment => Ok(self.request_payment(session_id, context).await),
            NextAction::Confirm => Ok(self.confirm(session_id, context).await),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    event_name = "turn.failed",
                    session_id = %session_id,
                    error = %err,
                    "turn fell back to the generic error reply"
                );
                self.error_outcome(session_id).await
            }
        }
    }

    fn prompt(
        &self,
        context: &SessionContext,
        extraction_hint: Option<String>,
        nothing_extracted: bool,
    ) -> TurnOutcome {
        let reply = match extraction_hint {
            Some(hint) => hint,
            None if nothing_extracted && context.missing_slots().len() == 4 => {
                self.assembler.safe_fallback()
            }
            None => self.assembler.prompt_for_missing_slots(context),
        };
        self.outcome(reply, Vec::new(), context)
    }

    async fn search(
        &self,
        session_id: &str,
        context: SessionContext,
    ) -> Result<TurnOutcome, ApplicationError> {
        let query = self.build_query(&context);
        let offers = self.fanout.search_all(&query).await;

        let reconciler = Arc::clone(&self.reconciler);
        let ranker = self.ranker.clone();
        let preference = context.preference.clone();
        let ranked = tokio::task::spawn_blocking(move || {
            let flights = reconciler.reconcile(&offers);
            ranker.rank(flights, preference.as_deref())
        })
        .await
        .map_err(|err| ApplicationError::Internal(format!("scoring task failed: {err}")))?;

        let cards = self.assembler.flight_cards(&ranked);
        let results = ranked.len();

        // Re-loads under the session lock, so slots merged by a message that
        // arrived during the search are not overwritten here.
        let context = self
            .store
            .update(session_id, |ctx| {
                ctx.last_results_count = Some(results);
                if results > 0 {
                    self.advance(ctx, BookingStage::Review);
                }
            })
            .await;
        let reply = self.assembler.flight_summary(&context, &cards);

        info!(
            event_name = "turn.search_completed",
            session_id = %session_id,
            results,
            "search results assembled"
        );
        Ok(self.outcome(reply, cards, &context))
    }

    async fn request_payment(&self, session_id: &str, context: SessionContext) -> TurnOutcome {
        let link = self.payments.generate(&context).await;
        let reply = self.assembler.payment_prompt(&link.upi_link);

        let context = self
            .store
            .update(session_id, |ctx| self.advance(ctx, BookingStage::Payment))
            .await;
        self.outcome(reply, Vec::new(), &context)
    }

    async fn confirm(&self, session_id: &str, context: SessionContext) -> TurnOutcome {
        let ticket = self.notifier.finalize(&context).await;
        let reply = self.assembler.confirmation(&ticket.pnr, &ticket.route, &ticket.date);

        let context = self
            .store
            .update(session_id, |ctx| self.advance(ctx, BookingStage::Confirmed))
            .await;
        self.outcome(reply, Vec::new(), &context)
    }

    /// Unmappable cities become empty codes; sources answer them with no
    /// offers and the summary reads as an empty search.
    fn build_query(&self, context: &SessionContext) -> SearchQuery {
        let code = |city: &Option<String>| {
            city.as_deref()
                .and_then(|name| self.cities.airport_code(name))
                .unwrap_or_default()
                .to_owned()
        };
        SearchQuery {
            from_code: code(&context.from),
            to_code: code(&context.to),
            date: context.date.clone().unwrap_or_default(),
            max_results: self.max_offers_per_source,
        }
    }

    fn advance(&self, context: &mut SessionContext, stage: BookingStage) {
        if let Err(err) = context.advance_stage(stage) {
            debug!(event_name = "turn.stage_unchanged", error = %err);
        }
    }

    fn outcome(
        &self,
        reply: String,
        flight_cards: Vec<FlightCard>,
        context: &SessionContext,
    ) -> TurnOutcome {
        TurnOutcome {
            reply,
            flight_cards,
            state_summary: self.assembler.state_summary(context),
            suggested_actions: self.assembler.suggested_actions(context),
            context_chip: self.assembler.context_chip(context),
        }
    }

    async fn error_outcome(&self, session_id: &str) -> TurnOutcome {
        let context = self.store.get(session_id).await.ok().flatten().unwrap_or_default();
        TurnOutcome {
            reply: ERROR_REPLY.to_owned(),
            flight_cards: Vec::new(),
            state_summary: self.assembler.state_summary(&context),
            suggested_actions: ERROR_ACTIONS.iter().map(|&a| a.to_owned()).collect(),
            context_chip: self.assembler.context_chip(&context),
        }
    }
}
