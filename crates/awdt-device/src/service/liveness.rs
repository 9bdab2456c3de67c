//! Liveness path: the watchdog and the loops that keep it from expiring.
//!
//! ```text
//! AWDT_Init ──→ Timer ⟲ poll
//! BusinessLogic ⟲ renewal ──→ AWDT_GetNonce ──→ Signer ──→ server
//!        └──→ Sensor ⟲ reading ──→ Signer ──→ server
//! server ──→ Verifier ──→ AWDT_PutTicket ──→ Timer (defer)
//! ```

use awdt_bus::{Directive, ProtocolEvent, RunOutcome};
use awdt_storage::layout::{STAGED_BOOT_TICKET, STAGING_AREA};
use awdt_types::{Envelope, HookPoint, MeasuredData, Payload, RequestType, Role, RunProfile};
use tracing::{debug, info, warn};

use super::{DeviceStation, Directives};
use crate::domain::{Countdown, DeviceState};

impl DeviceStation {
    pub(super) fn awdt_init(&self, former: Option<Role>, env: Envelope) -> Directives {
        match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::BootTicket(_))) => {
                vec![Directive::send(DeviceState::Timer, env)]
            }
            _ => self.unexpected(former, &env),
        }
    }

    pub(super) fn awdt_get_nonce(&self, former: Option<Role>, env: Envelope) -> Directives {
        match former {
            Some(Role::BusinessLogic) => self.request_fresh(env, RequestType::DefTicket),
            _ => self.unexpected(former, &env),
        }
    }

    pub(super) fn awdt_put_ticket(&self, former: Option<Role>, env: Envelope) -> Directives {
        match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::DefTicket(_))) => {
                self.mark(HookPoint::PutTicketEntered, &env);
                self.mark(HookPoint::PutTicketExited, &env);
                vec![Directive::send(DeviceState::Timer, env)]
            }
            _ => self.unexpected(former, &env),
        }
    }

    // -------------------------------------------------------------------------
    // Timer
    // -------------------------------------------------------------------------

    pub(super) fn timer(&mut self, former: Option<Role>, env: Envelope) -> Directives {
        match (former, env.payload.as_ref()) {
            (Some(Role::AwdtInit), Some(Payload::BootTicket(ticket))) => {
                let seconds = ticket.counter_init_seconds;
                self.arm(env, seconds)
            }
            (Some(Role::AwdtPutTicket), Some(Payload::DefTicket(ticket))) => {
                let seconds = ticket.deferral_seconds;
                self.defer(&env, seconds)
            }
            _ => self.unexpected(former, &env),
        }
    }

    fn arm(&mut self, env: Envelope, seconds: u64) -> Directives {
        let now = self.now();
        let countdown = Countdown::arm(now, seconds);
        self.timer.countdown = Some(countdown);
        info!(deadline = countdown.deadline(), seconds, "[device/timer] watchdog armed");

        let mut out = vec![Directive::Publish(ProtocolEvent::WatchdogArmed {
            deadline: countdown.deadline(),
        })];
        if self.timer.polling {
            return out;
        }

        self.mark(HookPoint::TimerFirstPollEntered, &env);
        let expired = countdown.is_expired(now);
        self.mark(HookPoint::TimerFirstPollExited, &env);

        if expired {
            out.extend(self.expire(env, countdown, now));
        } else {
            self.timer.polling = true;
            out.push(Directive::WakeupAfter {
                delay: self.ctx.config.poll_interval,
                envelope: env,
            });
        }
        out
    }

    /// Push the deadline out. Never starts a second polling chain.
    fn defer(&mut self, env: &Envelope, seconds: u64) -> Directives {
        let now = self.now();
        let Some(countdown) = self.timer.countdown.as_mut() else {
            warn!("[device/timer] deferral before the watchdog was armed, ignored");
            return Vec::new();
        };
        countdown.defer(now, seconds);
        let deadline = countdown.deadline();
        info!(deadline, seconds, "[device/timer] watchdog deferred");

        let mut out = vec![Directive::Publish(ProtocolEvent::WatchdogDeferred { deadline })];
        if RunProfile::for_scenario(env.scenario).end_after_deferral {
            out.push(Directive::Terminate(RunOutcome::DeferralApplied));
        }
        out
    }

    pub(super) fn timer_poll(&mut self, env: Envelope) -> Directives {
        let Some(countdown) = self.timer.countdown else {
            warn!("[device/timer] poll without a countdown, stopping");
            self.timer.polling = false;
            return Vec::new();
        };
        let now = self.now();
        if countdown.is_expired(now) {
            return self.expire(env, countdown, now);
        }
        debug!(remaining = countdown.remaining(now), "[device/timer] poll");
        vec![Directive::WakeupAfter {
            delay: self.ctx.config.poll_interval,
            envelope: env,
        }]
    }

    fn expire(&mut self, env: Envelope, countdown: Countdown, now: u64) -> Directives {
        self.timer.polling = false;
        warn!(
            deadline = countdown.deadline(),
            now, "[device/timer] watchdog expired, resetting"
        );
        vec![
            Directive::Publish(ProtocolEvent::WatchdogExpired {
                deadline: countdown.deadline(),
                now,
            }),
            Directive::send(DeviceState::Shutdown, env),
        ]
    }

    // -------------------------------------------------------------------------
    // Business logic and sensor
    // -------------------------------------------------------------------------

    pub(super) fn business_logic(&self, former: Option<Role>, env: Envelope) -> Directives {
        match (former, env.payload.as_ref()) {
            (Some(Role::Verifier), Some(Payload::BootTicket(_))) => {
                // Boot tickets are single-use.
                if let Err(e) = self.ctx.store.delete(STAGING_AREA, STAGED_BOOT_TICKET) {
                    warn!(error = %e, "[device/business_logic] boot ticket could not be unstaged");
                }
                info!("[device/business_logic] started");
                vec![
                    Directive::Publish(ProtocolEvent::BusinessLogicStarted),
                    Directive::send(DeviceState::Sensor, env.clone()),
                    Directive::WakeupAfter {
                        delay: self.ctx.config.renewal_interval,
                        envelope: env,
                    },
                ]
            }
            _ => self.unexpected(former, &env),
        }
    }

    /// Renewal period elapsed: ask for the next deferral ticket.
    pub(super) fn renewal_due(&self, env: Envelope) -> Directives {
        self.mark(HookPoint::RenewalWakeup, &env);
        vec![
            Directive::send(DeviceState::AwdtGetNonce, env.clone()),
            Directive::WakeupAfter {
                delay: self.ctx.config.renewal_interval,
                envelope: env,
            },
        ]
    }

    pub(super) fn sensor(&self, former: Option<Role>, env: Envelope) -> Directives {
        match former {
            Some(Role::BusinessLogic) => {
                let mut reading = env.clone();
                let value = self.ctx.entropy.sensor_value();
                reading.set_payload(Payload::MeasuredData(MeasuredData {
                    value,
                    timestamp: self.now(),
                }));
                debug!(value, "[device/sensor] reading taken");
                vec![
                    Directive::send(DeviceState::Signer, reading),
                    Directive::WakeupAfter {
                        delay: self.ctx.config.sensor_interval,
                        envelope: env,
                    },
                ]
            }
            _ => self.unexpected(former, &env),
        }
    }

    /// Re-enter the sensor with the same former role.
    pub(super) fn sensor_due(&self, mut env: Envelope) -> Directives {
        if let Err(e) = env.rewind() {
            return self.fail(e);
        }
        vec![Directive::send(DeviceState::Sensor, env)]
    }
}
