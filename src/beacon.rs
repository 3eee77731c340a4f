//! # Sensor Beacon
//!
//! The application loop of a battery powered weather node: wake up, poll the sensor now and
//! then, advertise the current record, sleep.
//!
//! ## Architecture
//!
//! - [`BeaconScheduler`]: decides on each wake-up whether to poll the sensor, tracks read
//!   failures and the battery level, and keeps the record that is advertised
//! - [`BatteryTracker`]: estimates the battery level from brown-out detector events
//! - [`run_beacon`]: async loop tying scheduler, advertiser and timer together
//!
//! ## Design Considerations
//!
//! - The last good measurement stays in the record when a read fails; the failure flag is
//!   only raised once more than `sensor_fail_read_threshold` consecutive reads failed
//! - Identical records are advertised without rebuilding the PDU (see
//!   [`crate::Advertiser::prepare`]), so most wake-ups only cost whitening and transmission
//! - Advertising errors are logged and the loop goes on; there is no retry within an event

use embassy_time::{Duration, Timer};
use log::{Level, log};

use crate::RadioPort;
use crate::advertiser::{Advertiser, AdvertisingError};
use crate::channel::ChannelSequencer;
use crate::messages::{BatteryLevel, DeviceAddress, ManufacturerData};
use crate::sensor::SensorSource;

/// Beacon timing and failure policy
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct BeaconConfiguration {
    /// Poll the sensor on every n-th wake-up (60 wake-ups of 2 s is once in 2 minutes)
    pub poll_sensor_every_n_wakeups: u8,
    /// Consecutive failed reads tolerated before the sensor failure flag is raised
    pub sensor_fail_read_threshold: u8,
    /// Transmissions per advertising event, each on the next channel of the sequence
    pub transmissions_per_event: u8,
    /// Sleep between two wake-ups
    pub wakeup_interval_ms: u64,
}

impl BeaconConfiguration {
    pub const fn new() -> Self {
        BeaconConfiguration {
            poll_sensor_every_n_wakeups: 60,
            sensor_fail_read_threshold: 10,
            transmissions_per_event: 3,
            wakeup_interval_ms: 2000,
        }
    }
}

impl Default for BeaconConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// Supply voltage supervisor of the platform
pub trait PowerMonitor {
    /// `true` if VDD dropped below the programmed threshold since it was last set
    fn is_below_threshold(&mut self) -> bool;

    /// Program the brown-out threshold for the next check
    fn set_threshold_millivolts(&mut self, millivolts: u16);
}

/// Battery level estimate driven by brown-out threshold crossings
///
/// The level only ever goes down: a battery does not recharge, and a voltage that recovers
/// under a lighter load says nothing about the remaining capacity.
#[derive(Clone, Copy, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct BatteryTracker {
    level: BatteryLevel,
}

impl BatteryTracker {
    pub const fn new() -> Self {
        BatteryTracker { level: BatteryLevel::High }
    }

    pub fn level(&self) -> BatteryLevel {
        self.level
    }

    /// Brown-out threshold that separates `level` from the next lower one
    pub const fn threshold_millivolts(level: BatteryLevel) -> u16 {
        match level {
            BatteryLevel::High => 2700,
            BatteryLevel::MediumHigh => 2500,
            BatteryLevel::MediumLow | BatteryLevel::Low => 2300,
        }
    }

    /// Step down one level if the monitor saw VDD below the threshold, then program the
    /// threshold for the (possibly new) level
    pub fn update<P: PowerMonitor + ?Sized>(&mut self, monitor: &mut P) -> BatteryLevel {
        if monitor.is_below_threshold() {
            self.level = self.level.lower();
            log!(Level::Info, "Battery level dropped to {}", self.level.bits());
        }
        monitor.set_threshold_millivolts(Self::threshold_millivolts(self.level));
        self.level
    }
}

/// Wake-up bookkeeping of a sensor beacon
#[cfg_attr(feature = "std", derive(Debug))]
pub struct BeaconScheduler {
    config: BeaconConfiguration,
    wakeups: u8,
    sensor_errors: u8,
    record: ManufacturerData,
    battery: BatteryTracker,
    sequencer: ChannelSequencer,
}

impl BeaconScheduler {
    /// Create a scheduler advertising `initial` until the first successful read
    pub fn new(config: BeaconConfiguration, initial: ManufacturerData) -> Self {
        BeaconScheduler {
            config,
            // The first wake-up polls the sensor
            wakeups: config.poll_sensor_every_n_wakeups,
            sensor_errors: 0,
            record: initial,
            battery: BatteryTracker::new(),
            sequencer: ChannelSequencer::new(),
        }
    }

    /// Account for one wake-up and return the record to advertise
    pub fn on_wakeup<S, P>(&mut self, sensor: &mut S, power: &mut P) -> &ManufacturerData
    where
        S: SensorSource + ?Sized,
        P: PowerMonitor + ?Sized,
    {
        self.wakeups = self.wakeups.saturating_add(1);
        if self.wakeups >= self.config.poll_sensor_every_n_wakeups {
            self.poll(sensor, power);
            self.wakeups = 0;
        }
        &self.record
    }

    fn poll<S, P>(&mut self, sensor: &mut S, power: &mut P)
    where
        S: SensorSource + ?Sized,
        P: PowerMonitor + ?Sized,
    {
        match sensor.read() {
            Ok(reading) => {
                self.record.humidity = reading.humidity;
                self.record.temperature = reading.temperature;
                self.sensor_errors = 0;
            }
            Err(_) => {
                self.sensor_errors = self.sensor_errors.saturating_add(1);
                log!(Level::Warn, "Sensor read failed, {} consecutive failures", self.sensor_errors);
            }
        }
        self.record.status.sensor_failure = self.sensor_errors > self.config.sensor_fail_read_threshold;
        self.record.status.battery_level = self.battery.update(power);
    }

    /// One wake-up followed by one advertising event
    pub fn run_event<R, S, P>(
        &mut self,
        advertiser: &mut Advertiser<R>,
        address: &DeviceAddress,
        sensor: &mut S,
        power: &mut P,
    ) -> Result<(), AdvertisingError<R::Error>>
    where
        R: RadioPort,
        S: SensorSource + ?Sized,
        P: PowerMonitor + ?Sized,
    {
        let record = *self.on_wakeup(sensor, power);
        advertiser.advertise_event(address, &record, self.config.transmissions_per_event, &mut self.sequencer)
    }

    pub fn config(&self) -> &BeaconConfiguration {
        &self.config
    }

    pub fn record(&self) -> &ManufacturerData {
        &self.record
    }

    /// Consecutive failed reads, saturating at 255
    pub fn sensor_errors(&self) -> u8 {
        self.sensor_errors
    }

    pub fn battery_level(&self) -> BatteryLevel {
        self.battery.level()
    }
}

/// Beacon main loop
///
/// Runs one wake-up and advertising event, then sleeps for `wakeup_interval_ms`. Never
/// returns; failed events are logged and skipped.
///
/// # Example
/// ```rust,ignore
/// let advertiser = Advertiser::new(radio, DeviceName::new("wNode1")?);
/// let scheduler = BeaconScheduler::new(BeaconConfiguration::default(), initial_record);
/// let address = DeviceAddress::random_static(&mut WyRand::seed_from_u64(seed));
/// run_beacon(advertiser, scheduler, address, dht22, brown_out).await;
/// ```
pub async fn run_beacon<R, S, P>(
    mut advertiser: Advertiser<R>,
    mut scheduler: BeaconScheduler,
    address: DeviceAddress,
    mut sensor: S,
    mut power: P,
) -> !
where
    R: RadioPort,
    S: SensorSource,
    P: PowerMonitor,
{
    log!(Level::Info, "Beacon started, wake-up interval {} ms", scheduler.config().wakeup_interval_ms);
    let interval = Duration::from_millis(scheduler.config().wakeup_interval_ms);
    loop {
        match scheduler.run_event(&mut advertiser, &address, &mut sensor, &mut power) {
            Ok(()) => {}
            Err(AdvertisingError::Size(_)) => {
                log!(Level::Warn, "Advertising event skipped: advertisement does not fit");
            }
            Err(AdvertisingError::NotPrepared) => {
                log!(Level::Warn, "Advertising event skipped: nothing prepared");
            }
            Err(AdvertisingError::Radio(_)) => {
                log!(Level::Warn, "Advertising event failed: radio error");
            }
        }
        Timer::after(interval).await;
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::RADIO_PAYLOAD_MAX;
    use crate::channel::AdvertisingChannel;
    use crate::messages::{DeviceName, Tenths};
    use crate::radio_devices::echo::RadioDevice as EchoRadio;
    use crate::scanner::{WeatherReport, decode_frame};
    use crate::sensor::{SensorError, SensorReading};
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Sensor returning scripted results, then failing
    struct ScriptedSensor {
        results: VecDeque<Result<SensorReading, SensorError>>,
        reads: u32,
    }

    impl ScriptedSensor {
        fn new(results: Vec<Result<SensorReading, SensorError>>) -> Self {
            ScriptedSensor {
                results: results.into(),
                reads: 0,
            }
        }

        fn always_failing() -> Self {
            Self::new(Vec::new())
        }
    }

    impl SensorSource for ScriptedSensor {
        fn read(&mut self) -> Result<SensorReading, SensorError> {
            self.reads += 1;
            self.results.pop_front().unwrap_or(Err(SensorError::NoResponse))
        }
    }

    #[derive(Default)]
    struct MockPowerMonitor {
        below: VecDeque<bool>,
        thresholds: Vec<u16>,
    }

    impl PowerMonitor for MockPowerMonitor {
        fn is_below_threshold(&mut self) -> bool {
            self.below.pop_front().unwrap_or(false)
        }

        fn set_threshold_millivolts(&mut self, millivolts: u16) {
            self.thresholds.push(millivolts);
        }
    }

    fn reading(humidity: i16, temperature: i16) -> SensorReading {
        SensorReading {
            humidity: Tenths::from_tenths(humidity),
            temperature: Tenths::from_tenths(temperature),
        }
    }

    fn initial_record() -> ManufacturerData {
        ManufacturerData::new(Tenths::from_tenths(730), Tenths::from_tenths(270))
    }

    #[test]
    fn default_configuration() {
        let config = BeaconConfiguration::default();
        assert_eq!(config.poll_sensor_every_n_wakeups, 60);
        assert_eq!(config.sensor_fail_read_threshold, 10);
        assert_eq!(config.transmissions_per_event, 3);
        assert_eq!(config.wakeup_interval_ms, 2000);
    }

    #[test]
    fn first_wakeup_polls_then_every_nth() {
        let config = BeaconConfiguration {
            poll_sensor_every_n_wakeups: 3,
            ..BeaconConfiguration::default()
        };
        let mut scheduler = BeaconScheduler::new(config, initial_record());
        let mut sensor = ScriptedSensor::new(vec![Ok(reading(500, 200)), Ok(reading(510, 210)), Ok(reading(520, 220))]);
        let mut power = MockPowerMonitor::default();

        scheduler.on_wakeup(&mut sensor, &mut power);
        assert_eq!(sensor.reads, 1);
        assert_eq!(scheduler.record().humidity, Tenths::from_tenths(500));

        scheduler.on_wakeup(&mut sensor, &mut power);
        scheduler.on_wakeup(&mut sensor, &mut power);
        assert_eq!(sensor.reads, 1);
        scheduler.on_wakeup(&mut sensor, &mut power);
        assert_eq!(sensor.reads, 2);
        assert_eq!(scheduler.record().temperature, Tenths::from_tenths(210));
    }

    #[test]
    fn failed_reads_keep_last_good_values_and_raise_flag_past_threshold() {
        let config = BeaconConfiguration {
            poll_sensor_every_n_wakeups: 1,
            sensor_fail_read_threshold: 2,
            ..BeaconConfiguration::default()
        };
        let mut scheduler = BeaconScheduler::new(config, initial_record());
        let mut sensor = ScriptedSensor::new(vec![
            Ok(reading(450, 123)),
            Err(SensorError::Checksum),
            Err(SensorError::NoResponse),
            Err(SensorError::NoResponse),
            Ok(reading(460, 124)),
        ]);
        let mut power = MockPowerMonitor::default();

        scheduler.on_wakeup(&mut sensor, &mut power);
        scheduler.on_wakeup(&mut sensor, &mut power);
        scheduler.on_wakeup(&mut sensor, &mut power);
        assert_eq!(scheduler.sensor_errors(), 2);
        assert!(!scheduler.record().status.sensor_failure);
        assert_eq!(scheduler.record().humidity, Tenths::from_tenths(450));

        scheduler.on_wakeup(&mut sensor, &mut power);
        assert!(scheduler.record().status.sensor_failure);
        assert_eq!(scheduler.record().temperature, Tenths::from_tenths(123));

        scheduler.on_wakeup(&mut sensor, &mut power);
        assert_eq!(scheduler.sensor_errors(), 0);
        assert!(!scheduler.record().status.sensor_failure);
        assert_eq!(scheduler.record().humidity, Tenths::from_tenths(460));
    }

    #[test]
    fn failure_counter_saturates() {
        let config = BeaconConfiguration {
            poll_sensor_every_n_wakeups: 1,
            ..BeaconConfiguration::default()
        };
        let mut scheduler = BeaconScheduler::new(config, initial_record());
        let mut sensor = ScriptedSensor::always_failing();
        let mut power = MockPowerMonitor::default();
        for _ in 0..300 {
            scheduler.on_wakeup(&mut sensor, &mut power);
        }
        assert_eq!(scheduler.sensor_errors(), 255);
        assert!(scheduler.record().status.sensor_failure);
    }

    #[test]
    fn battery_steps_down_and_programs_thresholds() {
        let mut tracker = BatteryTracker::new();
        let mut power = MockPowerMonitor {
            below: VecDeque::from(vec![false, true, false, true, true, true]),
            thresholds: Vec::new(),
        };
        let levels: Vec<BatteryLevel> = (0..6).map(|_| tracker.update(&mut power)).collect();

        assert_eq!(
            levels,
            vec![
                BatteryLevel::High,
                BatteryLevel::MediumHigh,
                BatteryLevel::MediumHigh,
                BatteryLevel::MediumLow,
                BatteryLevel::Low,
                BatteryLevel::Low,
            ]
        );
        assert_eq!(power.thresholds, vec![2700, 2500, 2500, 2300, 2300, 2300]);
    }

    #[test]
    fn event_advertises_current_record() {
        let config = BeaconConfiguration::default();
        let mut scheduler = BeaconScheduler::new(config, initial_record());
        let mut advertiser = Advertiser::new(EchoRadio::new(), DeviceName::new("wNode1").unwrap());
        let address = DeviceAddress::new_static_random([0xCB, 0x71, 0x1D, 0xBB, 0xA5, 0x6A]);
        let mut sensor = ScriptedSensor::new(vec![Ok(reading(615, -42))]);
        let mut power = MockPowerMonitor {
            below: VecDeque::from(vec![true]),
            thresholds: Vec::new(),
        };

        scheduler.run_event(&mut advertiser, &address, &mut sensor, &mut power).unwrap();
        assert_eq!(advertiser.radio().transmitted_count(), 3);

        let mut buffer = [0u8; RADIO_PAYLOAD_MAX];
        for channel in AdvertisingChannel::ALL {
            let length = advertiser.radio_mut().receive(&mut buffer).unwrap().unwrap();
            let advertisement = decode_frame(channel, &buffer[..length]).unwrap();
            let report = WeatherReport::from_advertisement(&advertisement).unwrap();
            assert_eq!(report.humidity, Tenths::from_tenths(615));
            assert_eq!(report.temperature, Tenths::from_tenths(-42));
            assert_eq!(report.battery_level, BatteryLevel::MediumHigh);
        }

        // No poll on the next wake-up, the PDU is reused
        scheduler.run_event(&mut advertiser, &address, &mut sensor, &mut power).unwrap();
        assert_eq!(sensor.reads, 1);
        assert_eq!(advertiser.rebuild_count(), 1);
    }

    /// Radio that rejects every frame during the first advertising event
    #[derive(Clone, Default)]
    struct FlakyRadio {
        power_ups: Rc<Cell<u32>>,
        delivered: Rc<Cell<u32>>,
    }

    impl RadioPort for FlakyRadio {
        type Error = ();

        fn set_frequency(&mut self, _mhz_offset: u8) -> Result<(), ()> {
            Ok(())
        }

        fn transmit(&mut self, _frame: &[u8]) -> Result<(), ()> {
            if self.power_ups.get() <= 1 {
                return Err(());
            }
            self.delivered.set(self.delivered.get() + 1);
            Ok(())
        }

        fn transmit_queue_empty(&mut self) -> Result<bool, ()> {
            Ok(true)
        }

        fn power_up(&mut self) -> Result<(), ()> {
            self.power_ups.set(self.power_ups.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn beacon_keeps_advertising_after_a_radio_error() {
        let radio = FlakyRadio::default();
        let power_ups = radio.power_ups.clone();
        let delivered = radio.delivered.clone();

        let config = BeaconConfiguration {
            wakeup_interval_ms: 1,
            ..BeaconConfiguration::default()
        };
        let beacon = run_beacon(
            Advertiser::new(radio, DeviceName::new("wNode1").unwrap()),
            BeaconScheduler::new(config, initial_record()),
            DeviceAddress::new_static_random([0xCB, 0x71, 0x1D, 0xBB, 0xA5, 0x6A]),
            ScriptedSensor::new(vec![Ok(reading(615, -42))]),
            MockPowerMonitor::default(),
        );

        let result = embassy_futures::block_on(embassy_time::with_timeout(Duration::from_millis(100), beacon));
        assert!(result.is_err());
        assert!(power_ups.get() > 1);
        assert!(delivered.get() >= 3);
    }
}
