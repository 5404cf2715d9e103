/// Monthly business figures served when the user asks for sample data
pub const DEMO_FILE_NAME: &str = "skillset_growth_data.csv";

pub const DEMO_CSV: &str = "Date,Month,Revenue,Expenses,ActiveUsers,CourseSales,NewStudents
2023-01-01,Jan,15000,8000,1200,450,120
2023-02-01,Feb,18500,9500,1450,520,150
2023-03-01,Mar,22000,10000,1800,600,200
2023-04-01,Apr,21500,11000,1950,580,180
2023-05-01,May,26000,12000,2300,750,250
2023-06-01,Jun,29000,13500,2800,820,310
2023-07-01,Jul,34000,14000,3400,950,380
2023-08-01,Aug,32500,13800,3600,900,350
2023-09-01,Sep,38000,15000,4200,1100,450
2023-10-01,Oct,42000,16500,4900,1250,510
2023-11-01,Nov,48000,18000,5600,1400,600
2023-12-01,Dec,55000,20000,6500,1600,720";
