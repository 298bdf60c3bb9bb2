#![allow(dead_code)]

use std::fs;
use std::path::Path;

use logistics_risk_dashboard::config::DashboardConfig;
use tempfile::TempDir;

pub const TRAFFIC: &str = "\
Start_Time,HourOfDay,DayOfWeek,Month,Risk_Score,Risk_Category,Main_Weather,Duration(min),Severity
2021-03-01 08:15:00,8,0,3,0.81,High,Rain,45,3
2021-03-01 17:40:00,17,0,3,0.77,High,Snow,60,4
2021-03-02 09:05:00,9,1,3,0.70,High,Clear,30,3
2021-04-03 12:30:00,12,5,4,0.55,Medium,Fog,25,2
2021-04-04 14:00:00,14,6,4,0.52,Medium,Clear,20,2
2021-05-05 02:10:00,2,2,5,0.20,Low Impact,Clear,10,1
2021-05-06 03:20:00,3,3,5,0.18,Low Impact,Clear,12,1
2021-05-07 23:45:00,23,4,5,0.15,Low Impact,Rain,8,1
2021-06-08 18:00:00,18,1,6,0.10,Low Impact,Thunderstorm,5,1
2021-06-09 07:30:00,7,2,6,0.95,Critical,Thunderstorm,120,4
";

pub const AIRLINE: &str = "\
year,carrier_name,airport_name,arr_flights,arr_del15,arr_delay,arr_cancelled,arr_diverted,carrier_ct,weather_ct,nas_ct,security_ct,late_aircraft_ct,carrier_delay,weather_delay,nas_delay,security_delay,late_aircraft_delay
2021,Delta,Atlanta,100,20,900,2,0,6,1,5,0,8,250,40,200,0,410
2021,United,Chicago,80,24,1200,1,1,8,2,6,1,7,400,90,260,10,440
2022,Delta,Atlanta,120,18,700,0,0,5,1,4,0,8,200,30,150,0,320
2022,United,Denver,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
";

pub const RAILROAD: &str = "\
Accident Type,Total Damage Cost,Total Persons Killed,Total Persons Injured,Hazmat Cars,Hazmat Cars Damaged,Persons Evacuated,Niveau_criticité,Risque_composite,Latitude,Longitude,County Name,State Name,Report Year,TimeOfDay
Derailment,150000,0,2,1,0,0,Moyen,0.45,41.2,-87.6,Cook,Illinois,2019,Tôt le matin
Collision,900000,1,5,3,2,40,Élevé,0.90,34.0,-118.2,Los Angeles,California,2019,Après-midi
Derailment,50000,0,0,0,0,0,Faible,0.10,29.7,-95.3,Harris,Texas,2020,EVENING
Autre,20000,0,0,0,0,0,Faible,0.05,,,Cook,Illinois,2020,DARK
Collision,300000,0,1,0,0,0,Moyen,0.40,10.0,10.0,Harris,Texas,2021,LATE MORNING
";

pub const SHIPPING: &str = "\
Acc_Type,Location,Risk_Score,Year,Latitude,Longitude,Geo_Zone,Geo_Latitude_Zone,Geo_Longitude_Zone,Pollution_Score,Damage_Severe,Ship_Profile_Score
Grounding,Port,0.30,2010,59.4,24.7,Gulf of Finland,North,East,0.1,0.4,0.5
Collision,Sea,0.80,2011,55.6,12.9,Sound,South,West,0.6,0.9,0.7
Grounding,Port approach,0.45,2011,57.7,11.9,Kattegat,South,West,0.2,0.5,0.6
Fire,Open sea,0.65,2012,58.0,20.0,Central Baltic,Central,Central,0.0,0.7,0.8
Other,Sea,0.20,2013,95.0,20.0,Central Baltic,Central,Central,0.0,0.1,0.3
";

pub const SUPPLY_CHAIN: &str = "\
product_id,supplier_id,supplier_country,Risk_Score,Resilience_Index,lead_time_days,delivery_time_deviation,route_risk_level,disruption_likelihood_score,delay_probability,supplier_reliability_score,risk_classification
P1,S1,China,0.40,0.50,7,2,4,0.3,0.2,0.9,Moderate Risk
P2,S1,China,0.55,0.40,9,3,6,0.5,0.4,0.8,High Risk
P3,S2,Germany,0.20,0.70,3,-1,2,0.1,0.1,0.95,Low Risk
P4,S3,Mexico,0.35,0.55,5,0,3,0.3,0.3,0.85,Moderate Risk
P5,S2,Germany,0.25,0.65,4,-2,2,0.2,0.1,0.9,Low Risk
";

pub const LAST_MILE: &str = "\
Delivery_Time,Weather,Traffic,delivery_risk,Area,area_risk_score,Category,Order_Date,Order_Time,weather_traffic_resilience_score
150,Stormy,Jam,1,Metropolitian,0.6,Electronics,2022-03-14,19:30:00,0.3
90,Sunny,Low,0,Urban,0.2,Grocery,2022-03-15,10:15:00,0.9
130,Fog,High,1,Metropolitian,0.6,Electronics,2022-03-16,18:45:00,0.4
60,Sunny,Low,0,Urban,0.2,Books,2022-03-17,08:00:00,0.9
100,Cloudy,Medium,0,Semi-Urban,0.3,Grocery,2022-03-18,13:20:00,0.7
";

pub fn write_csv(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// All six datasets under their default file names.
pub fn dataset_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let defaults = DashboardConfig::default();
    write_csv(tmp.path(), &defaults.data.traffic, TRAFFIC);
    write_csv(tmp.path(), &defaults.data.airline, AIRLINE);
    write_csv(tmp.path(), &defaults.data.railroad, RAILROAD);
    write_csv(tmp.path(), &defaults.data.shipping, SHIPPING);
    write_csv(tmp.path(), &defaults.data.supply_chain, SUPPLY_CHAIN);
    write_csv(tmp.path(), &defaults.data.last_mile, LAST_MILE);
    tmp
}

pub fn config_for(dir: &Path) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.data.dir = dir.to_path_buf();
    config.ui.preview_rows = 3;
    config
}
