//! Subscriber management: signup, onboarding, cadence and status changes.

use uuid::Uuid;

use super::Pipeline;
use crate::{
  Error, Result,
  activity::ActivityKind,
  notify::{Channel, Notifier, Recipient},
  schedule::ScheduleFrequency,
  store::PipelineStore,
  subscriber::{CustomerStatus, NewSubscriber, Subscriber},
};

impl<S, N> Pipeline<S, N>
where
  S: PipelineStore,
  N: Notifier,
{
  pub async fn create_subscriber(&self, input: NewSubscriber) -> Result<Subscriber> {
    let mut subscriber = Subscriber {
      subscriber_id:   Uuid::new_v4(),
      name:            input.name,
      schedule:        input.schedule,
      timezone:        input.timezone,
      customer_status: CustomerStatus::Lead,
      contact:         input.contact,
      platforms:       input.platforms,
      root_folder:     None,
      is_onboarded:    false,
      created_at:      self.clock.now(),
      joined_at:       None,
    };
    subscriber.ensure_root_folder();

    self.store.save_subscriber(&subscriber).await.map_err(Error::store)?;
    tracing::info!(subscriber_id = %subscriber.subscriber_id, "subscriber created");
    self
      .record(
        subscriber.subscriber_id,
        ActivityKind::Info,
        "Subscriber added".to_owned(),
        None,
      )
      .await;
    Ok(subscriber)
  }

  /// Mark the profile complete. Calling this twice is a no-op.
  pub async fn complete_onboarding(&self, subscriber_id: Uuid) -> Result<Subscriber> {
    let _guard = self.lock_existing(subscriber_id).await?;
    let mut subscriber = self.subscriber(subscriber_id).await?;
    if subscriber.is_onboarded {
      return Ok(subscriber);
    }

    let now = self.clock.now();
    subscriber.ensure_root_folder();
    subscriber.is_onboarded = true;
    subscriber.joined_at = Some(now);
    subscriber.customer_status = CustomerStatus::Active;
    self.store.save_subscriber(&subscriber).await.map_err(Error::store)?;
    tracing::info!(%subscriber_id, "subscriber onboarded");

    self
      .record(subscriber_id, ActivityKind::Info, "User completed onboarding".to_owned(), None)
      .await;

    let forecast = self.scheduler.forecast(
      subscriber.today(now),
      subscriber.schedule,
      self.config.welcome_forecast_days,
    );
    let days: Vec<String> = forecast
      .iter()
      .map(|d| format!("• {}", d.format("%A, %b %-d")))
      .collect();
    let message = format!(
      "Welcome to ThoughtVoice, {}!\n\nDelivery forecast:\n{}",
      subscriber.name,
      days.join("\n")
    );
    self
      .dispatch(Recipient::Subscriber(subscriber_id), Channel::Email, message)
      .await;
    Ok(subscriber)
  }

  pub async fn set_schedule(
    &self,
    subscriber_id: Uuid,
    schedule: ScheduleFrequency,
  ) -> Result<Subscriber> {
    let _guard = self.lock_existing(subscriber_id).await?;
    let mut subscriber = self.subscriber(subscriber_id).await?;
    subscriber.schedule = schedule;
    self.store.save_subscriber(&subscriber).await.map_err(Error::store)?;
    tracing::info!(%subscriber_id, %schedule, "delivery cadence changed");
    Ok(subscriber)
  }

  pub async fn set_customer_status(
    &self,
    subscriber_id: Uuid,
    status: CustomerStatus,
  ) -> Result<Subscriber> {
    let _guard = self.lock_existing(subscriber_id).await?;
    let mut subscriber = self.subscriber(subscriber_id).await?;
    subscriber.customer_status = status;
    self.store.save_subscriber(&subscriber).await.map_err(Error::store)?;
    self
      .record(
        subscriber_id,
        ActivityKind::Info,
        format!("Customer status set to {}", status.as_str()),
        None,
      )
      .await;
    Ok(subscriber)
  }

  pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
    self.store.list_subscribers().await.map_err(Error::store)
  }
}
